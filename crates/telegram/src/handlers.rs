//! Update extraction: teloxide types in, dispatcher events out.

use {
    teloxide::types::{CallbackQuery, Message},
    tracing::debug,
};

use mistok_common::{PartyId, types::display_name};

use crate::{
    dispatch::{Dispatcher, InboundCallback, InboundContact, InboundMessage},
    error::Result,
    outbound::MessageRef,
};

/// Handle one inbound message update.
///
/// Only private chats are served; the bot has no group-chat surface.
pub async fn handle_message(msg: Message, dispatcher: &Dispatcher) -> Result<()> {
    if !msg.chat.is_private() {
        debug!(chat_id = msg.chat.id.0, "ignoring non-private chat message");
        return Ok(());
    }
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let from = PartyId(user.id.0 as i64);

    if let Some(contact) = msg.contact() {
        return dispatcher
            .handle_contact(InboundContact {
                from,
                phone: contact.phone_number.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                username: user.username.clone(),
            })
            .await;
    }

    let full_name = display_name(
        from,
        &user.first_name,
        user.last_name.as_deref(),
        user.username.as_deref(),
    );
    dispatcher
        .handle_message(InboundMessage {
            from,
            text: msg.text().map(ToOwned::to_owned),
            message: MessageRef(msg.id.0),
            full_name,
        })
        .await
}

/// Handle one inline-button press.
pub async fn handle_callback_query(query: CallbackQuery, dispatcher: &Dispatcher) -> Result<()> {
    let from = PartyId(query.from.id.0 as i64);
    let message = query
        .message
        .as_ref()
        .map(|m| (PartyId(m.chat().id.0), MessageRef(m.id().0)));
    dispatcher
        .handle_callback(InboundCallback {
            id: query.id.clone(),
            from,
            message,
            data: query.data.clone().unwrap_or_default(),
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        testkit::{Harness, Sent, USER},
        texts,
    };
    use serde_json::json;

    fn private_message(text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 77,
            "date": 1754000000,
            "chat": { "id": 100, "type": "private", "first_name": "Test" },
            "from": {
                "id": 100,
                "is_bot": false,
                "first_name": "Test",
                "last_name": "User"
            },
            "text": text,
        }))
        .unwrap()
    }

    fn contact_message(phone: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 78,
            "date": 1754000000,
            "chat": { "id": 100, "type": "private", "first_name": "Test" },
            "from": {
                "id": 100,
                "is_bot": false,
                "first_name": "Test",
                "last_name": "User"
            },
            "contact": {
                "phone_number": phone,
                "first_name": "Test",
                "user_id": 100
            },
        }))
        .unwrap()
    }

    fn group_message(text: &str) -> Message {
        serde_json::from_value(json!({
            "message_id": 79,
            "date": 1754000000,
            "chat": { "id": -100500, "type": "group", "title": "some group" },
            "from": {
                "id": 100,
                "is_bot": false,
                "first_name": "Test"
            },
            "text": text,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn text_message_reaches_the_dispatcher() {
        let h = Harness::new().await;
        handle_message(private_message("/start"), &h.dispatcher)
            .await
            .unwrap();
        // No phone on file: the gate answers.
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn contact_message_upserts_profile() {
        let h = Harness::new().await;
        handle_message(contact_message("+1555"), &h.dispatcher)
            .await
            .unwrap();
        assert_eq!(
            h.transport.sent()[0],
            Sent::text(USER, texts::CONTACT_SAVED_USER, Some(crate::menus::Menu::Main))
        );
    }

    #[tokio::test]
    async fn group_messages_are_ignored() {
        let h = Harness::new().await;
        handle_message(group_message("hello"), &h.dispatcher)
            .await
            .unwrap();
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn callback_query_without_data_is_only_acked() {
        let h = Harness::new().await;
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "cb-9",
            "from": { "id": 1, "is_bot": false, "first_name": "Admin" },
            "chat_instance": "ci-1",
        }))
        .unwrap();
        handle_callback_query(query, &h.dispatcher).await.unwrap();
        assert_eq!(h.transport.acked(), vec!["cb-9".to_string()]);
        assert!(h.transport.sent().is_empty());
    }
}
