//! The dispatcher: one fixed priority policy applied to every inbound event.
//!
//! For a message from party P, first match wins:
//! 1. contact sharing → profile upsert + menu reply,
//! 2. non-admin without a phone on file → phone prompt, nothing else,
//! 3. active relay session → swallow admin slash-commands, honor the
//!    terminate keyword, otherwise forward verbatim,
//! 4. menu dispatch.
//!
//! The ordering is the point: a party can never bypass identification by
//! being in a session, and a party mid-session never triggers a menu action
//! except the explicit terminate keyword.

use std::sync::Arc;

use tracing::{info, warn};

use {
    mistok_common::PartyId,
    mistok_relay::{MenuAction, MenuFlow, SessionTable, UserCommand},
    mistok_storage::{ConsultationStore, ProfileStore, UserProfile},
};

use crate::{
    access::AdminRoster,
    error::{Error, Result},
    menus::Menu,
    outbound::{MessageRef, Transport},
    texts,
};

/// An inbound chat message, already reduced to what the policy needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub from: PartyId,
    pub text: Option<String>,
    pub message: MessageRef,
    pub full_name: String,
}

/// An inbound contact-sharing event.
#[derive(Debug, Clone)]
pub struct InboundContact {
    pub from: PartyId,
    pub phone: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// An inbound callback-button press.
#[derive(Debug, Clone)]
pub struct InboundCallback {
    pub id: String,
    pub from: PartyId,
    /// Chat and message the pressed keyboard hangs off, when accessible.
    pub message: Option<(PartyId, MessageRef)>,
    pub data: String,
}

pub struct Dispatcher {
    pub(crate) roster: AdminRoster,
    pub(crate) sessions: SessionTable,
    pub(crate) menu: MenuFlow,
    pub(crate) profiles: Arc<dyn ProfileStore>,
    pub(crate) consultations: Arc<dyn ConsultationStore>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(
        roster: AdminRoster,
        menu: MenuFlow,
        profiles: Arc<dyn ProfileStore>,
        consultations: Arc<dyn ConsultationStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            roster,
            sessions: SessionTable::new(),
            menu,
            profiles,
            consultations,
            transport,
        }
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// The menu a party gets back whenever a flow returns them to idle.
    pub(crate) fn menu_for(&self, party: PartyId) -> Menu {
        if self.roster.is_admin(party) {
            Menu::Admin
        } else {
            Menu::Main
        }
    }

    // ── step 1: contact sharing ─────────────────────────────────────────────

    pub async fn handle_contact(&self, contact: InboundContact) -> Result<()> {
        let profile = UserProfile {
            user_id: contact.from,
            first_name: contact.first_name,
            last_name: contact.last_name.unwrap_or_default(),
            username: contact.username.unwrap_or_default(),
            phone: contact.phone,
        };
        self.profiles
            .upsert(&profile)
            .await
            .map_err(Error::Storage)?;
        info!(user = %contact.from, "profile upserted from shared contact");

        if self.roster.is_admin(contact.from) {
            self.transport
                .send_text(contact.from, texts::CONTACT_SAVED_ADMIN, Some(Menu::Admin))
                .await
        } else {
            self.transport
                .send_text(contact.from, texts::CONTACT_SAVED_USER, Some(Menu::Main))
                .await
        }
    }

    // ── steps 2–4: everything else ──────────────────────────────────────────

    pub async fn handle_message(&self, msg: InboundMessage) -> Result<()> {
        let from = msg.from;
        let is_admin = self.roster.is_admin(from);
        let text = msg.text.as_deref().unwrap_or("");

        // Step 2: the phone gate. A non-identified party cannot use the bot
        // at all, active session or not.
        if !is_admin
            && self
                .profiles
                .phone(from)
                .await
                .map_err(Error::Storage)?
                .is_none()
        {
            let prompt = if is_start_command(text) {
                texts::PHONE_PROMPT_START
            } else {
                texts::PHONE_PROMPT_GATE
            };
            return self
                .transport
                .send_text(from, prompt, Some(Menu::SharePhone))
                .await;
        }

        // Step 3: active relay session.
        if let Some(counterpart) = self.sessions.counterpart_of(from) {
            // 3a: an administrator's slash-commands are not relayed.
            if is_admin && text.starts_with('/') {
                return Ok(());
            }
            // 3b: the terminate keyword.
            if self.menu.commands().is_terminate(text) {
                return self.end_session(from, counterpart).await;
            }
            // 3c: forward verbatim.
            return self.relay(from, counterpart, &msg).await;
        }

        // Step 4: menu dispatch. Non-text content outside a session has
        // nowhere to go.
        let Some(text) = msg.text.as_deref() else {
            return Ok(());
        };
        if let Some(command) = text.trim().strip_prefix('/') {
            return self.handle_slash(from, is_admin, command).await;
        }
        self.run_menu(from, is_admin, text, &msg.full_name).await
    }

    async fn handle_slash(&self, from: PartyId, is_admin: bool, command: &str) -> Result<()> {
        let name = command.split_whitespace().next().unwrap_or("");
        match name {
            "start" => {
                if is_admin {
                    self.transport
                        .send_text(from, texts::WELCOME_ADMIN, Some(Menu::Admin))
                        .await
                } else {
                    // The phone gate already passed, so the menu is theirs.
                    self.transport
                        .send_text(from, texts::WELCOME_USER, Some(Menu::Main))
                        .await
                }
            }
            "consultations" => self.list_consultations(from).await,
            "users" => self.list_users(from).await,
            _ => {
                let (reply, menu) = if is_admin {
                    (texts::CHOOSE_MENU_BUTTON, Menu::Admin)
                } else {
                    (texts::UNKNOWN_COMMAND, Menu::Main)
                };
                self.transport.send_text(from, reply, Some(menu)).await
            }
        }
    }

    async fn run_menu(
        &self,
        from: PartyId,
        is_admin: bool,
        text: &str,
        full_name: &str,
    ) -> Result<()> {
        match self.menu.transition(from, is_admin, text) {
            MenuAction::ShowService(service) => {
                let description = match service {
                    UserCommand::SiteCreation => texts::SERVICE_SITE_CREATION,
                    UserCommand::MapPins => texts::SERVICE_MAP_PINS,
                    _ => texts::SERVICE_CONTEXT_ADS,
                };
                self.transport
                    .send_text(from, description, Some(Menu::ServiceOptions))
                    .await
            }
            MenuAction::PromptDatetime => {
                self.transport
                    .send_text(from, texts::CONSULTATION_INTRO, None)
                    .await?;
                self.transport
                    .send_text(from, texts::CONSULTATION_PROMPT, Some(Menu::Remove))
                    .await
            }
            MenuAction::SubmitConsultation(datetime) => {
                let id = self
                    .consultations
                    .append(from, &datetime)
                    .await
                    .map_err(Error::Storage)?;
                info!(user = %from, consultation = id, "consultation request recorded");
                self.transport
                    .send_text(from, texts::CONSULTATION_THANKS, Some(Menu::Main))
                    .await?;
                self.notify_admins(&texts::consultation_notification(from, full_name, &datetime))
                    .await;
                Ok(())
            }
            MenuAction::ContactAdmins => {
                self.transport
                    .send_text(from, texts::CONTACT_REQUEST_SENT, Some(Menu::Main))
                    .await?;
                self.notify_admins(&texts::contact_request_notification(from, full_name))
                    .await;
                Ok(())
            }
            MenuAction::BackToMain => {
                self.transport
                    .send_text(from, texts::MAIN_MENU, Some(Menu::Main))
                    .await
            }
            MenuAction::Admin(action) => self.admin_action(from, action).await,
            MenuAction::Unknown => {
                let (reply, menu) = if is_admin {
                    (texts::CHOOSE_MENU_BUTTON, Menu::Admin)
                } else {
                    (texts::UNKNOWN_COMMAND, Menu::Main)
                };
                self.transport.send_text(from, reply, Some(menu)).await
            }
        }
    }

    // ── relay session paths ─────────────────────────────────────────────────

    async fn end_session(&self, from: PartyId, counterpart: PartyId) -> Result<()> {
        self.sessions.end(from);
        info!(party = %from, counterpart = %counterpart, "relay session ended");

        // Both parties learn the chat is over and get their own menu back;
        // a send failure to one must not silence the other.
        for party in [counterpart, from] {
            if let Err(e) = self
                .transport
                .send_text(party, texts::CHAT_ENDED, Some(self.menu_for(party)))
                .await
            {
                warn!(party = %party, error = %e, "failed to deliver session-end notice");
            }
        }
        Ok(())
    }

    /// Forward verbatim; on failure fall back to the text content, and when
    /// there is none, tell the sender. The session always survives.
    async fn relay(&self, from: PartyId, to: PartyId, msg: &InboundMessage) -> Result<()> {
        match self.transport.copy_message(to, from, msg.message).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(from = %from, to = %to, error = %e, "relay copy failed, falling back");
                match msg.text.as_deref() {
                    Some(text) => {
                        if let Err(e) = self.transport.send_text(to, text, None).await {
                            warn!(from = %from, to = %to, error = %e, "relay text fallback failed");
                        }
                    }
                    None => {
                        if let Err(e) = self
                            .transport
                            .send_text(from, texts::RELAY_FAILED, None)
                            .await
                        {
                            warn!(party = %from, error = %e, "failed to notify sender of relay failure");
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Bounded fan-out: one failed delivery never blocks the rest.
    pub(crate) async fn notify_admins(&self, text: &str) {
        for admin in self.roster.iter() {
            if let Err(e) = self.transport.send_text(admin, text, None).await {
                warn!(admin = %admin, error = %e, "failed to notify administrator");
            }
        }
    }
}

fn is_start_command(text: &str) -> bool {
    text.trim()
        .strip_prefix('/')
        .and_then(|rest| rest.split_whitespace().next())
        .is_some_and(|name| name == "start")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{Harness, Sent, ADMIN, OTHER_ADMIN, USER, USER_B};

    // ── scenario A: the phone gate and contact sharing ──────────────────────

    #[tokio::test]
    async fn start_without_phone_prompts_for_contact() {
        let h = Harness::new().await;
        h.dispatcher.handle_message(h.text(USER, "/start")).await.unwrap();

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            Sent::text(USER, texts::PHONE_PROMPT_START, Some(Menu::SharePhone))
        );
    }

    #[tokio::test]
    async fn shared_contact_upserts_profile_and_unlocks_menu() {
        let h = Harness::new().await;
        h.dispatcher
            .handle_contact(InboundContact {
                from: USER,
                phone: "+1555".into(),
                first_name: "User".into(),
                last_name: None,
                username: Some("user".into()),
            })
            .await
            .unwrap();

        assert_eq!(
            h.profiles.phone(USER).await.unwrap(),
            Some("+1555".to_string())
        );
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(USER, texts::CONTACT_SAVED_USER, Some(Menu::Main))
        );

        // The menu now answers instead of the gate.
        h.dispatcher.handle_message(h.text(USER, "/start")).await.unwrap();
        assert_eq!(
            h.transport.sent()[1],
            Sent::text(USER, texts::WELCOME_USER, Some(Menu::Main))
        );
    }

    #[tokio::test]
    async fn phone_gate_overrides_active_session() {
        let h = Harness::new().await;
        // Pair the (unidentified) user with an admin directly.
        h.dispatcher.sessions.start(ADMIN, USER).unwrap();

        h.dispatcher.handle_message(h.text(USER, "hello")).await.unwrap();

        let sent = h.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            Sent::text(USER, texts::PHONE_PROMPT_GATE, Some(Menu::SharePhone))
        );
        // Nothing reached the counterpart and the pairing still stands.
        assert_eq!(h.dispatcher.sessions.counterpart_of(ADMIN), Some(USER));
    }

    #[tokio::test]
    async fn admins_bypass_the_phone_gate() {
        let h = Harness::new().await;
        h.dispatcher.handle_message(h.text(ADMIN, "/start")).await.unwrap();
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(ADMIN, texts::WELCOME_ADMIN, Some(Menu::Admin))
        );
    }

    // ── scenario B: the consultation flow ───────────────────────────────────

    #[tokio::test]
    async fn consultation_flow_records_and_notifies_admins() {
        let h = Harness::with_user_phone().await;

        h.dispatcher
            .handle_message(h.text(USER, "Консультації"))
            .await
            .unwrap();
        let sent = h.transport.sent();
        assert_eq!(sent[0], Sent::text(USER, texts::CONSULTATION_INTRO, None));
        assert_eq!(
            sent[1],
            Sent::text(USER, texts::CONSULTATION_PROMPT, Some(Menu::Remove))
        );

        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "20.09 10:00"))
            .await
            .unwrap();

        let rows = h.consultations.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, USER);
        assert_eq!(rows[0].datetime, "20.09 10:00");

        let sent = h.transport.sent();
        assert_eq!(
            sent[0],
            Sent::text(USER, texts::CONSULTATION_THANKS, Some(Menu::Main))
        );
        // Every administrator hears about it, with the id and the text.
        let expected = texts::consultation_notification(USER, "Test User", "20.09 10:00");
        assert_eq!(sent[1], Sent::text(ADMIN, &expected, None));
        assert_eq!(sent[2], Sent::text(OTHER_ADMIN, &expected, None));

        // State is consumed: the same text is now unknown.
        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "20.09 10:00"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(USER, texts::UNKNOWN_COMMAND, Some(Menu::Main))
        );
    }

    #[tokio::test]
    async fn admin_broadcast_survives_one_failing_recipient() {
        let h = Harness::with_user_phone().await;
        h.transport.fail_sends_to(ADMIN);

        h.dispatcher
            .handle_message(h.text(USER, "Консультації"))
            .await
            .unwrap();
        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "завтра о 10"))
            .await
            .unwrap();

        // The second admin still got the notification.
        let expected = texts::consultation_notification(USER, "Test User", "завтра о 10");
        assert!(h
            .transport
            .sent()
            .contains(&Sent::text(OTHER_ADMIN, &expected, None)));
    }

    // ── scenario C: relay sessions ──────────────────────────────────────────

    #[tokio::test]
    async fn relay_roundtrip_and_terminate() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;

        assert_eq!(h.dispatcher.sessions.counterpart_of(ADMIN), Some(USER));
        assert_eq!(h.dispatcher.sessions.counterpart_of(USER), Some(ADMIN));

        // Admin → user, forwarded verbatim.
        h.transport.clear();
        h.dispatcher.handle_message(h.text(ADMIN, "hello")).await.unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::copy(USER, ADMIN, h.message_ref())]
        );

        // User terminates: table empties, both see their menus.
        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "завершити чат"))
            .await
            .unwrap();
        assert!(h.dispatcher.sessions.is_empty());
        let sent = h.transport.sent();
        assert!(sent.contains(&Sent::text(ADMIN, texts::CHAT_ENDED, Some(Menu::Admin))));
        assert!(sent.contains(&Sent::text(USER, texts::CHAT_ENDED, Some(Menu::Main))));
    }

    #[tokio::test]
    async fn terminate_keyword_is_trimmed_and_case_insensitive() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.dispatcher
            .handle_message(h.text(USER, "  ЗАВЕРШИТИ ЧАТ "))
            .await
            .unwrap();
        assert!(h.dispatcher.sessions.is_empty());
    }

    #[tokio::test]
    async fn admin_slash_commands_are_swallowed_in_session() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.transport.clear();

        h.dispatcher
            .handle_message(h.text(ADMIN, "/users"))
            .await
            .unwrap();
        assert!(h.transport.sent().is_empty());
        assert_eq!(h.dispatcher.sessions.counterpart_of(ADMIN), Some(USER));
    }

    #[tokio::test]
    async fn user_slash_text_is_relayed_in_session() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.transport.clear();

        h.dispatcher.handle_message(h.text(USER, "/start")).await.unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::copy(ADMIN, USER, h.message_ref())]
        );
    }

    #[tokio::test]
    async fn menu_labels_are_relayed_not_interpreted_in_session() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.transport.clear();

        h.dispatcher
            .handle_message(h.text(USER, "Консультації"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::copy(ADMIN, USER, h.message_ref())]
        );
        // No pending state was created.
        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "завершити чат"))
            .await
            .unwrap();
        h.transport.clear();
        h.dispatcher
            .handle_message(h.text(USER, "20.09 10:00"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(USER, texts::UNKNOWN_COMMAND, Some(Menu::Main))
        );
    }

    // ── relay failure fallbacks ─────────────────────────────────────────────

    #[tokio::test]
    async fn copy_failure_falls_back_to_text() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.transport.fail_copies();
        h.transport.clear();

        h.dispatcher.handle_message(h.text(ADMIN, "hello")).await.unwrap();
        assert_eq!(h.transport.sent(), vec![Sent::text(USER, "hello", None)]);
        // Session survives the failure.
        assert_eq!(h.dispatcher.sessions.counterpart_of(ADMIN), Some(USER));
    }

    #[tokio::test]
    async fn copy_failure_without_text_notifies_sender_only() {
        let h = Harness::with_user_phone().await;
        h.start_chat(ADMIN, USER).await;
        h.transport.fail_copies();
        h.transport.clear();

        let mut msg = h.text(ADMIN, "ignored");
        msg.text = None;
        h.dispatcher.handle_message(msg).await.unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::text(ADMIN, texts::RELAY_FAILED, None)]
        );
    }

    // ── menu dispatch oddments ──────────────────────────────────────────────

    #[tokio::test]
    async fn service_entry_shows_description_with_options() {
        let h = Harness::with_user_phone().await;
        h.dispatcher
            .handle_message(h.text(USER, "Створення сайту"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(USER, texts::SERVICE_SITE_CREATION, Some(Menu::ServiceOptions))
        );
    }

    #[tokio::test]
    async fn contact_admins_notifies_every_admin() {
        let h = Harness::with_user_phone().await;
        h.dispatcher
            .handle_message(h.text(USER, "Зв’язатися з адміністрацією"))
            .await
            .unwrap();
        let sent = h.transport.sent();
        assert_eq!(
            sent[0],
            Sent::text(USER, texts::CONTACT_REQUEST_SENT, Some(Menu::Main))
        );
        let expected = texts::contact_request_notification(USER, "Test User");
        assert_eq!(sent[1], Sent::text(ADMIN, &expected, None));
        assert_eq!(sent[2], Sent::text(OTHER_ADMIN, &expected, None));
    }

    #[tokio::test]
    async fn admin_end_chat_outside_session_is_a_menu_reply() {
        let h = Harness::new().await;
        h.dispatcher
            .handle_message(h.text(ADMIN, "Завершити чат"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::text(ADMIN, texts::NOT_IN_CHAT, Some(Menu::Admin))]
        );
    }

    #[tokio::test]
    async fn unknown_admin_text_hints_at_the_menu() {
        let h = Harness::new().await;
        h.dispatcher
            .handle_message(h.text(ADMIN, "щось дивне"))
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent(),
            vec![Sent::text(ADMIN, texts::CHOOSE_MENU_BUTTON, Some(Menu::Admin))]
        );
    }

    #[tokio::test]
    async fn non_text_outside_session_is_ignored() {
        let h = Harness::with_user_phone().await;
        let mut msg = h.text(USER, "ignored");
        msg.text = None;
        h.dispatcher.handle_message(msg).await.unwrap();
        assert!(h.transport.sent().is_empty());
    }

    // ── session takeover ────────────────────────────────────────────────────

    #[tokio::test]
    async fn takeover_notifies_displaced_counterpart() {
        let h = Harness::with_user_phone().await;
        h.profiles.set_phone(USER_B, "+2").await;
        h.start_chat(ADMIN, USER).await;
        h.transport.clear();

        // The same admin starts a chat with someone else.
        h.start_chat(ADMIN, USER_B).await;

        assert_eq!(h.dispatcher.sessions.counterpart_of(ADMIN), Some(USER_B));
        assert_eq!(h.dispatcher.sessions.counterpart_of(USER), None);
        // The displaced user was told their chat ended.
        assert!(h
            .transport
            .sent()
            .contains(&Sent::text(USER, texts::CHAT_ENDED, Some(Menu::Main))));
    }
}
