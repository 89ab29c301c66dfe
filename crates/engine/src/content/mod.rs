//! XML blueprint definitions.
//!
//! `*.xml` files under the blueprint directory declare `<Blueprint>` elements
//! that are parsed into a [`BlueprintDatabase`] and then installed into an
//! [`Engine`](crate::app::Engine), registering any new kind, action and data
//! names on the way.

mod compiler;
mod database;
mod discovery;

pub use compiler::{
    compile_blueprint_database, load_blueprints, ContentCompileError, ContentErrorCode,
    SourceLocation,
};
pub use database::{
    AnimationDef, BlueprintDatabase, BlueprintDef, DefOrigin, FrameDef, FrameSource,
};
