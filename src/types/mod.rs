mod models;

pub use models::{
    AuthorRef, Post, PostSummary, ProfilePicture, Session, Topic, TopicRef, User, ViewerContext,
};
