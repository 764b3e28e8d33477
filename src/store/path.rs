use std::fmt;

const USERS: &str = "users";
const CHATS: &str = "chats";
const MESSAGES: &str = "messages";
const SAVED_MESSAGES: &str = "savedMessages";

/// Slash-separated path of a collection, e.g. `chats/{chatId}/messages`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn users() -> Self {
        Self(USERS.to_owned())
    }

    pub fn chats() -> Self {
        Self(CHATS.to_owned())
    }

    pub fn messages(chat_id: &str) -> Self {
        Self(format!("{CHATS}/{chat_id}/{MESSAGES}"))
    }

    pub fn saved_messages(user_id: &str) -> Self {
        Self(format!("{USERS}/{user_id}/{SAVED_MESSAGES}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath {
            collection: self.clone(),
            id: id.to_owned(),
        }
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath {
    collection: CollectionPath,
    id: String,
}

impl DocumentPath {
    pub fn user(user_id: &str) -> Self {
        CollectionPath::users().doc(user_id)
    }

    pub fn chat(chat_id: &str) -> Self {
        CollectionPath::chats().doc(chat_id)
    }

    pub fn message(chat_id: &str, message_id: &str) -> Self {
        CollectionPath::messages(chat_id).doc(message_id)
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
