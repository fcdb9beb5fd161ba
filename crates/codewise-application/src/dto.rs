//! Response bodies of the assistant operations.

use serde::{Deserialize, Serialize};

/// Reply of the chat operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_reply_wire_shape() {
        let reply = ChatReply {
            response: "Hello!".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            serde_json::json!({ "response": "Hello!" })
        );
    }
}
