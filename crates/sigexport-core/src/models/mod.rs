pub mod contact;
pub mod group_metadata;
pub mod message;

pub use contact::{Contact, Contacts};
pub use group_metadata::{
    FlatMemberRow, GroupExport, GroupMetadata, MemberMetadata, EXPORTED_ON_FORMAT,
};
pub use message::{Attachment, Conversations, Message, MessagePayload, Reaction};
