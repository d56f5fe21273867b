//! Administrator actions: listings with per-row inline actions, deletions,
//! and session starts, all behind the allow-list guard.

use tracing::{info, warn};

use {
    mistok_common::PartyId,
    mistok_relay::AdminCommand,
    mistok_storage::{ConsultationRow, UserProfile},
};

use crate::{
    dispatch::{Dispatcher, InboundCallback},
    error::{Error, Result},
    menus::{self, InlineButton, Menu},
    texts,
};

impl Dispatcher {
    /// Execute an admin menu action. The guard runs here (not only in the
    /// menu flow) so the slash-command aliases share the same denial path.
    pub(crate) async fn admin_action(&self, caller: PartyId, action: AdminCommand) -> Result<()> {
        match action {
            AdminCommand::ListConsultations => self.list_consultations(caller).await,
            AdminCommand::ListUsers => self.list_users(caller).await,
            AdminCommand::ListUsersForDeletion => self.list_users_for_deletion(caller).await,
            AdminCommand::EndChat => {
                // Reached only outside a session; in-session termination is
                // the dispatcher's 3b path.
                self.transport
                    .send_text(caller, texts::NOT_IN_CHAT, Some(Menu::Admin))
                    .await
            }
        }
    }

    pub(crate) async fn list_consultations(&self, caller: PartyId) -> Result<()> {
        if self.roster.check_admin(caller).is_err() {
            return self.transport.send_text(caller, texts::NO_ACCESS, None).await;
        }

        let rows = self
            .consultations
            .list_all()
            .await
            .map_err(Error::Storage)?;
        if rows.is_empty() {
            return self
                .transport
                .send_text(caller, texts::NO_CONSULTATIONS, None)
                .await;
        }

        let mut lines = vec![texts::CONSULTATIONS_HEADER.to_owned()];
        let mut buttons: Vec<Vec<InlineButton>> = Vec::new();
        for row in &rows {
            lines.push(consultation_line(row));
            buttons.push(vec![menus::delete_consultation_button(row.id)]);
        }

        self.transport
            .send_text(caller, &lines.join("\n"), Some(Menu::Inline(buttons)))
            .await
    }

    pub(crate) async fn list_users(&self, caller: PartyId) -> Result<()> {
        self.render_user_list(caller, texts::USERS_HEADER, menus::start_chat_button)
            .await
    }

    pub(crate) async fn list_users_for_deletion(&self, caller: PartyId) -> Result<()> {
        self.render_user_list(
            caller,
            texts::USERS_FOR_DELETION_HEADER,
            menus::delete_user_button,
        )
        .await
    }

    /// Shared listing body: every profile gets a line, every profile except
    /// the caller gets the per-row action button.
    async fn render_user_list(
        &self,
        caller: PartyId,
        header: &str,
        button: impl Fn(PartyId) -> InlineButton,
    ) -> Result<()> {
        if self.roster.check_admin(caller).is_err() {
            return self.transport.send_text(caller, texts::NO_ACCESS, None).await;
        }

        let rows = self.profiles.list_all().await.map_err(Error::Storage)?;
        if rows.is_empty() {
            return self
                .transport
                .send_text(caller, texts::USERS_EMPTY, None)
                .await;
        }

        let mut lines = vec![header.to_owned()];
        let mut buttons: Vec<Vec<InlineButton>> = Vec::new();
        for row in &rows {
            lines.push(user_line(row));
            if row.user_id != caller {
                buttons.push(vec![button(row.user_id)]);
            }
        }

        let menu = (!buttons.is_empty()).then_some(Menu::Inline(buttons));
        self.transport.send_text(caller, &lines.join("\n"), menu).await
    }

    // ── callback-button actions ─────────────────────────────────────────────

    pub async fn handle_callback(&self, cb: InboundCallback) -> Result<()> {
        // Ack first so the client drops its spinner even if we bail out.
        if let Err(e) = self.transport.answer_callback(&cb.id).await {
            warn!(callback = %cb.id, error = %e, "failed to answer callback query");
        }

        let Some((prefix, raw_id)) = cb.data.split_once(':') else {
            return Ok(());
        };
        if !matches!(
            prefix,
            menus::CB_START_CHAT | menus::CB_DELETE_CONSULTATION | menus::CB_DELETE_USER
        ) {
            return Ok(());
        }

        if self.roster.check_admin(cb.from).is_err() {
            return self.callback_reply(&cb, texts::NO_ACCESS_SHORT).await;
        }

        let Ok(id) = raw_id.parse::<i64>() else {
            return self.callback_reply(&cb, texts::INVALID_DATA).await;
        };

        match prefix {
            menus::CB_START_CHAT => self.start_chat_with(&cb, PartyId(id)).await,
            menus::CB_DELETE_CONSULTATION => self.delete_consultation(&cb, id).await,
            _ => self.delete_user(&cb, PartyId(id)).await,
        }
    }

    async fn start_chat_with(&self, cb: &InboundCallback, target: PartyId) -> Result<()> {
        if target == cb.from {
            return self.callback_reply(cb, texts::SELF_CHAT_FORBIDDEN).await;
        }

        let outcome = match self.sessions.start(cb.from, target) {
            Ok(outcome) => outcome,
            Err(mistok_relay::Error::InvalidPairing) => {
                return self.callback_reply(cb, texts::SELF_CHAT_FORBIDDEN).await;
            }
        };

        // Whoever lost their pairing to this takeover hears about it;
        // nobody is left typing into a dead session.
        for displaced in &outcome.displaced {
            if let Err(e) = self
                .transport
                .send_text(*displaced, texts::CHAT_ENDED, Some(self.menu_for(*displaced)))
                .await
            {
                warn!(party = %displaced, error = %e, "failed to notify displaced party");
            }
        }

        if !outcome.already_active {
            info!(admin = %cb.from, user = %target, "relay session started");
            if let Err(e) = self
                .transport
                .send_text(cb.from, &texts::chat_started_admin(target), None)
                .await
            {
                warn!(admin = %cb.from, error = %e, "failed to deliver session-start notice");
            }
            if let Err(e) = self
                .transport
                .send_text(target, texts::CHAT_STARTED_USER, None)
                .await
            {
                warn!(user = %target, error = %e, "failed to deliver session-start notice");
            }
        }

        self.callback_reply(cb, texts::CHAT_LAUNCHED).await
    }

    async fn delete_consultation(&self, cb: &InboundCallback, id: i64) -> Result<()> {
        let deleted = self
            .consultations
            .delete(id)
            .await
            .map_err(Error::Storage)?;
        let reply = if deleted {
            info!(admin = %cb.from, consultation = id, "consultation deleted");
            texts::consultation_deleted(id)
        } else {
            texts::consultation_not_found(id)
        };
        self.callback_reply(cb, &reply).await
    }

    async fn delete_user(&self, cb: &InboundCallback, target: PartyId) -> Result<()> {
        if target == cb.from {
            return self.callback_reply(cb, texts::SELF_DELETE_FORBIDDEN).await;
        }

        // Requests first, then the profile; the requests of a half-deleted
        // account must not survive it.
        self.consultations
            .delete_for_user(target)
            .await
            .map_err(Error::Storage)?;
        let deleted = self.profiles.delete(target).await.map_err(Error::Storage)?;
        let reply = if deleted {
            info!(admin = %cb.from, user = %target, "user account deleted");
            texts::user_deleted(target)
        } else {
            texts::user_not_found(target)
        };
        self.callback_reply(cb, &reply).await
    }

    /// Edit the originating message when it is still accessible, otherwise
    /// fall back to a plain send.
    async fn callback_reply(&self, cb: &InboundCallback, text: &str) -> Result<()> {
        match cb.message {
            Some((chat, message)) => self.transport.edit_text(chat, message, text).await,
            None => self.transport.send_text(cb.from, text, None).await,
        }
    }
}

fn user_line(profile: &UserProfile) -> String {
    let name = profile.display_name();
    let username = if profile.username.is_empty() {
        "-"
    } else {
        &profile.username
    };
    let phone = if profile.phone.is_empty() {
        "-"
    } else {
        &profile.phone
    };
    format!("{} | {} | @{} | {}", profile.user_id, name, username, phone)
}

fn consultation_line(row: &ConsultationRow) -> String {
    format!(
        "#{} | user_id:{} | @{} | {} | {} | додано: {}",
        row.id,
        row.user_id,
        row.username.as_deref().unwrap_or("-"),
        row.phone.as_deref().unwrap_or("-"),
        row.datetime,
        row.created_at
    )
}
