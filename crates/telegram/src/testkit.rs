//! Shared test doubles: a recording transport and in-memory stores.

use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use async_trait::async_trait;

use {
    mistok_common::PartyId,
    mistok_relay::MenuFlow,
    mistok_storage::{ConsultationRow, ConsultationStore, ProfileStore, UserProfile},
};

use crate::{
    access::AdminRoster,
    dispatch::{Dispatcher, InboundCallback, InboundMessage},
    error::{Error, Result},
    menus::{self, Menu},
    outbound::{MessageRef, Transport},
};

pub(crate) const ADMIN: PartyId = PartyId(1);
pub(crate) const OTHER_ADMIN: PartyId = PartyId(2);
pub(crate) const USER: PartyId = PartyId(100);
pub(crate) const USER_B: PartyId = PartyId(200);

const MESSAGE: MessageRef = MessageRef(77);

// ── recording transport ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    Text {
        to: PartyId,
        text: String,
        menu: Option<Menu>,
    },
    Copy {
        to: PartyId,
        from: PartyId,
        message: MessageRef,
    },
    Edit {
        chat: PartyId,
        message: MessageRef,
        text: String,
    },
}

impl Sent {
    pub(crate) fn text(to: PartyId, text: &str, menu: Option<Menu>) -> Self {
        Self::Text {
            to,
            text: text.to_owned(),
            menu,
        }
    }

    pub(crate) fn copy(to: PartyId, from: PartyId, message: MessageRef) -> Self {
        Self::Copy { to, from, message }
    }

    pub(crate) fn edit(chat: PartyId, message: MessageRef, text: &str) -> Self {
        Self::Edit {
            chat,
            message,
            text: text.to_owned(),
        }
    }
}

#[derive(Default)]
pub(crate) struct MockTransport {
    sent: Mutex<Vec<Sent>>,
    acked: Mutex<Vec<String>>,
    fail_copy: AtomicBool,
    fail_send_to: Mutex<HashSet<i64>>,
}

impl MockTransport {
    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn acked(&self) -> Vec<String> {
        self.acked.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub(crate) fn fail_copies(&self) {
        self.fail_copy.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_sends_to(&self, party: PartyId) {
        self.fail_send_to
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(party.0);
    }

    fn record(&self, item: Sent) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).push(item);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&self, to: PartyId, text: &str, menu: Option<Menu>) -> Result<()> {
        let failing = self
            .fail_send_to
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&to.0);
        if failing {
            return Err(Error::message(format!("send to {to} refused by test")));
        }
        self.record(Sent::text(to, text, menu));
        Ok(())
    }

    async fn copy_message(&self, to: PartyId, from: PartyId, message: MessageRef) -> Result<()> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(Error::message("copy refused by test"));
        }
        self.record(Sent::copy(to, from, message));
        Ok(())
    }

    async fn edit_text(&self, chat: PartyId, message: MessageRef, text: &str) -> Result<()> {
        self.record(Sent::edit(chat, message, text));
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.acked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(callback_id.to_owned());
        Ok(())
    }
}

// ── in-memory stores ────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct MemProfiles {
    inner: Mutex<BTreeMap<i64, UserProfile>>,
}

impl MemProfiles {
    pub(crate) async fn set_phone(&self, id: PartyId, phone: &str) {
        self.upsert(&UserProfile {
            user_id: id,
            first_name: "Test".into(),
            last_name: "User".into(),
            username: "testuser".into(),
            phone: phone.into(),
        })
        .await
        .ok();
    }
}

#[async_trait]
impl ProfileStore for MemProfiles {
    async fn upsert(&self, profile: &UserProfile) -> anyhow::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(profile.user_id.0, profile.clone());
        Ok(())
    }

    async fn phone(&self, id: PartyId) -> anyhow::Result<Option<String>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id.0)
            .map(|p| p.phone.clone())
            .filter(|p| !p.is_empty()))
    }

    async fn list_all(&self) -> anyhow::Result<Vec<UserProfile>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect())
    }

    async fn delete(&self, id: PartyId) -> anyhow::Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id.0)
            .is_some())
    }
}

#[derive(Default)]
pub(crate) struct MemConsultations {
    rows: Mutex<Vec<ConsultationRow>>,
    next_id: AtomicI64,
}

#[async_trait]
impl ConsultationStore for MemConsultations {
    async fn append(&self, user_id: PartyId, datetime_text: &str) -> anyhow::Result<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ConsultationRow {
                id,
                user_id,
                username: None,
                phone: None,
                datetime: datetime_text.to_owned(),
                created_at: "2026-08-06 12:00:00".into(),
            });
        Ok(id)
    }

    async fn list_all(&self) -> anyhow::Result<Vec<ConsultationRow>> {
        let mut rows = self
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn delete_for_user(&self, user_id: PartyId) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().unwrap_or_else(|e| e.into_inner());
        let before = rows.len();
        rows.retain(|r| r.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }
}

// ── harness ─────────────────────────────────────────────────────────────────

pub(crate) struct Harness {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) transport: Arc<MockTransport>,
    pub(crate) profiles: Arc<MemProfiles>,
    pub(crate) consultations: Arc<MemConsultations>,
}

impl Harness {
    pub(crate) async fn new() -> Self {
        let transport = Arc::new(MockTransport::default());
        let profiles = Arc::new(MemProfiles::default());
        let consultations = Arc::new(MemConsultations::default());
        let dispatcher = Dispatcher::new(
            AdminRoster::new(vec![ADMIN, OTHER_ADMIN]),
            MenuFlow::new(menus::command_table()),
            Arc::clone(&profiles) as Arc<dyn ProfileStore>,
            Arc::clone(&consultations) as Arc<dyn ConsultationStore>,
            Arc::clone(&transport) as Arc<dyn Transport>,
        );
        Self {
            dispatcher,
            transport,
            profiles,
            consultations,
        }
    }

    pub(crate) async fn with_user_phone() -> Self {
        let h = Self::new().await;
        h.profiles.set_phone(USER, "+1555").await;
        h
    }

    pub(crate) fn text(&self, from: PartyId, text: &str) -> InboundMessage {
        InboundMessage {
            from,
            text: Some(text.to_owned()),
            message: MESSAGE,
            full_name: "Test User".into(),
        }
    }

    pub(crate) fn callback(&self, from: PartyId, data: &str) -> InboundCallback {
        InboundCallback {
            id: "cb-1".into(),
            from,
            message: Some((from, MessageRef(5))),
            data: data.to_owned(),
        }
    }

    pub(crate) fn message_ref(&self) -> MessageRef {
        MESSAGE
    }

    /// Pair `admin` with `user` the way the UI does it: via the start-chat
    /// callback button.
    pub(crate) async fn start_chat(&self, admin: PartyId, user: PartyId) {
        self.dispatcher
            .handle_callback(self.callback(admin, &format!("startchat:{}", user.0)))
            .await
            .ok();
    }
}
