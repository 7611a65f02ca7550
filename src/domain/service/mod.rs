pub mod access_policy;
pub mod delivery_client;
pub mod message_renderer;
pub mod notification_ledger;
pub mod recipient_resolver;

pub use access_policy::AccessPolicy;
pub use delivery_client::{DeliveryError, MessagingChannel, SentMessage};
pub use message_renderer::{MessageRenderer, RenderError};
pub use notification_ledger::{LedgerError, NotificationLedger};
pub use recipient_resolver::RecipientResolver;
