use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::{Blueprint, BlueprintId, Color, DataKey, Engine, Facing, Image};

use super::compiler::{ContentCompileError, ContentErrorCode, SourceLocation};

/// Where a definition came from, for error reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefOrigin {
    pub file_path: PathBuf,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameSource {
    /// Relative path of a PNG below the asset directory.
    File(String),
    /// Solid image in one palette colour.
    Fill { color: Color, width: u32, height: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameDef {
    pub source: FrameSource,
    pub origin: DefOrigin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub facing: Facing,
    pub action: String,
    pub frames: Vec<FrameDef>,
}

/// One `<Blueprint>` element, with named values still spelled as names.
#[derive(Debug, Clone, PartialEq)]
pub struct BlueprintDef {
    pub name: String,
    pub kind: Option<String>,
    pub default_facing: Option<Facing>,
    pub default_action: Option<String>,
    pub animate_when_idle: Option<bool>,
    pub numbers: Vec<(String, f32)>,
    pub texts: Vec<(String, String)>,
    pub flags: Vec<(String, bool)>,
    pub animations: Vec<AnimationDef>,
    pub origin: DefOrigin,
}

#[derive(Debug, Default, Clone)]
pub struct BlueprintDatabase {
    defs: Vec<BlueprintDef>,
    index_by_name: HashMap<String, usize>,
}

impl BlueprintDatabase {
    pub(crate) fn from_defs(defs: Vec<BlueprintDef>) -> Self {
        let index_by_name = defs
            .iter()
            .enumerate()
            .map(|(index, def)| (def.name.clone(), index))
            .collect();
        Self {
            defs,
            index_by_name,
        }
    }

    pub fn def(&self, name: &str) -> Option<&BlueprintDef> {
        self.index_by_name
            .get(name)
            .and_then(|index| self.defs.get(*index))
    }

    pub fn defs(&self) -> &[BlueprintDef] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registers every definition with `engine`, decoding frame files below
    /// `asset_dir`. Unknown kind, action and data names are registered on the
    /// way. Nothing is installed when any frame fails to load.
    pub fn install(
        &self,
        engine: &mut Engine,
        asset_dir: &Path,
    ) -> Result<Vec<BlueprintId>, ContentCompileError> {
        let mut built = Vec::with_capacity(self.defs.len());
        for def in &self.defs {
            built.push(build_blueprint(def, engine, asset_dir)?);
        }
        Ok(built
            .into_iter()
            .map(|blueprint| engine.insert_blueprint(blueprint))
            .collect())
    }
}

fn build_blueprint(
    def: &BlueprintDef,
    engine: &mut Engine,
    asset_dir: &Path,
) -> Result<Blueprint, ContentCompileError> {
    let kind = match &def.kind {
        Some(name) => engine.sprite_kinds_mut().register(name),
        None => engine.sprite_kinds_mut().issue(),
    };
    let mut blueprint = Blueprint::new(&def.name, kind);
    if let Some(facing) = def.default_facing {
        blueprint.set_default_facing(facing);
    }
    if let Some(action) = &def.default_action {
        blueprint.set_default_action(engine.action_names_mut().register(action));
    }
    if let Some(value) = def.animate_when_idle {
        blueprint.set_animate_when_idle(value);
    }

    for (name, value) in &def.numbers {
        blueprint.set_data_value(data_key(engine, name), *value);
    }
    for (name, value) in &def.texts {
        blueprint.set_text_value(data_key(engine, name), value.clone());
    }
    for (name, value) in &def.flags {
        blueprint.set_flag_value(data_key(engine, name), *value);
    }

    for animation in &def.animations {
        let action = engine.action_names_mut().register(&animation.action);
        let frames = animation
            .frames
            .iter()
            .map(|frame| load_frame(frame, asset_dir))
            .collect::<Result<Vec<_>, _>>()?;
        blueprint.set_images(animation.facing, action, frames);
    }

    debug!(
        blueprint = %def.name,
        kind = kind.0,
        animations = def.animations.len(),
        "blueprint_built"
    );
    Ok(blueprint)
}

fn data_key(engine: &mut Engine, name: &str) -> DataKey {
    engine.data_names_mut().register(name)
}

fn load_frame(frame: &FrameDef, asset_dir: &Path) -> Result<Image, ContentCompileError> {
    match &frame.source {
        FrameSource::Fill {
            color,
            width,
            height,
        } => Ok(Image::filled(*width, *height, *color)),
        FrameSource::File(key) => {
            let path = asset_dir.join(key);
            Image::open(&path).map_err(|error| ContentCompileError {
                code: ContentErrorCode::ImageLoad,
                message: format!("failed to load frame image {}: {error}", path.display()),
                file_path: frame.origin.file_path.clone(),
                location: Some(frame.origin.location),
            })
        }
    }
}
