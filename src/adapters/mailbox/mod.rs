//! Mailbox adapters. Implement ConversationSource.

pub mod label_dir;
pub mod memory_source;

pub use label_dir::LabelDirSource;
pub use memory_source::MemoryConversationSource;
