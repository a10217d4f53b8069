mod decay;
mod schema;
mod session;

pub use decay::{DecayConfig, FieldDecayEngine};
pub use schema::{
    default_form_schema, load_comments, load_form_schema, Comment, FieldDescriptor, FieldType,
    FormSchema,
};
pub use session::{
    CommentRotation, FormSessionController, SessionConfig, INTRO_MESSAGE, SESSION_TIMEOUT_MESSAGE,
};
