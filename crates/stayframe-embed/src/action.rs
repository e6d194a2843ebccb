//! Effects the embedded app's driver applies.

use serde::{Serialize, Serializer};
use stayframe_proto::Message;

use crate::flow::Step;

/// Effects for the embedded app's driver.
///
/// Serialized as `{"action": "<snake_case>", ...}` for the JavaScript shim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EmbedAction {
    /// Post a message to the parent window.
    PostToParent {
        /// Message to post.
        #[serde(serialize_with = "serialize_message")]
        message: Message,
    },

    /// Render a booking step inside the iframe.
    RenderStep {
        /// Step to render.
        step: Step,
    },
}

fn serialize_message<S: Serializer>(message: &Message, serializer: S) -> Result<S::Ok, S::Error> {
    stayframe_proto::encode(message).serialize(serializer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_for_the_shim() {
        let post = EmbedAction::PostToParent { message: Message::CloseModal };
        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            json!({"action": "post_to_parent", "message": {"type": "CLOSE_MODAL"}})
        );

        let render = EmbedAction::RenderStep { step: Step::GuestDetails };
        assert_eq!(
            serde_json::to_value(&render).unwrap(),
            json!({"action": "render_step", "step": "guest_details"})
        );
    }
}
