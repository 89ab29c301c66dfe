mod bitmap;
mod blueprint;
mod context;
mod data_bank;
pub mod dialog;
mod engine;
mod game_object;
pub mod host;
mod input;
mod keyed_table;
mod loop_runner;
mod metrics;
mod named_values;
mod object_store;
mod screen;

pub use bitmap::{Color, Image, DEFAULT_IMAGE_SIZE};
pub use blueprint::{Blueprint, BlueprintId, BlueprintRegistry, FrameTable};
pub use context::{ObjectCallback, ObjectCallbacks, ObjectContext, ScreenCallback, ScreenContext};
pub use data_bank::DataBank;
pub use dialog::{DialogResult, ModalDialog};
pub use engine::Engine;
pub use game_object::{
    apply_damage, can_attack, frame_interval_ms, perform_attack, GameObject, ObjectHandle,
};
pub use host::{HeadlessHost, Host, Rect, Sprite, SpriteFlags, SpriteHandle, Tilemap};
pub use input::{Button, ButtonEdges, ButtonStates};
pub use keyed_table::KeyedTable;
pub use loop_runner::{
    run_frames, EngineConfig, FrameClock, FrameReport, ObjectScope, RunSummary,
};
pub use metrics::LoopMetricsSnapshot;
pub use named_values::{
    ActionKind, ActionNames, DataKey, DataNames, Facing, NamedToken, NamedValues, SpriteKind,
    SpriteKindRegistry,
};
pub use object_store::ObjectStore;
pub use screen::{GameScreen, ScreenState, SpriteSnapshot, DEFAULT_MUSIC_VOLUME};
