mod chains;
mod conversations;

pub use chains::{ChainRepository, ChainRunRepository, StepRepository, StepResponseRepository};
pub use conversations::{ConversationRepository, MessageRepository};
