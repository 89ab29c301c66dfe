use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::info;

use crate::app::{Color, Engine, Facing, DEFAULT_IMAGE_SIZE};
use crate::asset_keys::validate_asset_key;
use crate::AppPaths;

use super::database::{
    AnimationDef, BlueprintDatabase, BlueprintDef, DefOrigin, FrameDef, FrameSource,
};
use super::discovery::collect_xml_files_sorted;

const MAX_FILL_SIZE: u32 = 1024;
const PALETTE_SIZE: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateBlueprint,
    ImageLoad,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

/// Parses every blueprint file below `blueprints_dir`. Files load in path
/// order, definitions in document order; a name may be defined only once.
pub fn compile_blueprint_database(
    blueprints_dir: &Path,
) -> Result<BlueprintDatabase, ContentCompileError> {
    if !blueprints_dir.is_dir() {
        return Err(ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: "blueprint directory not found".to_string(),
            file_path: blueprints_dir.to_path_buf(),
            location: None,
        });
    }
    let xml_files = collect_xml_files_sorted(blueprints_dir)
        .map_err(|error| read_error(error.path, error.source))?;

    let mut seen = HashSet::<String>::new();
    let mut defs = Vec::<BlueprintDef>::new();
    for xml_file in &xml_files {
        let raw = fs::read_to_string(xml_file)
            .map_err(|source| read_error(xml_file.clone(), source))?;
        for def in parse_blueprints_document(xml_file, &raw)? {
            if !seen.insert(def.name.clone()) {
                return Err(ContentCompileError {
                    code: ContentErrorCode::DuplicateBlueprint,
                    message: format!(
                        "duplicate Blueprint '{}'; each name may be defined only once",
                        def.name
                    ),
                    file_path: def.origin.file_path,
                    location: Some(def.origin.location),
                });
            }
            defs.push(def);
        }
    }

    info!(
        files = xml_files.len(),
        blueprints = defs.len(),
        dir = %blueprints_dir.display(),
        "blueprints_compiled"
    );
    Ok(BlueprintDatabase::from_defs(defs))
}

/// Compiles the project's blueprint files and installs them into `engine`.
/// Returns how many blueprints were installed.
pub fn load_blueprints(
    engine: &mut Engine,
    paths: &AppPaths,
) -> Result<usize, ContentCompileError> {
    let database = compile_blueprint_database(&paths.blueprints_dir)?;
    let installed = database.install(engine, &paths.asset_dir)?;
    info!(installed = installed.len(), "blueprints_installed");
    Ok(installed.len())
}

struct Parser<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

fn parse_blueprints_document(
    file_path: &Path,
    raw: &str,
) -> Result<Vec<BlueprintDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let parser = Parser {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Blueprints" {
        return Err(parser.error(
            ContentErrorCode::InvalidRoot,
            "root element must be <Blueprints>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::<BlueprintDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "Blueprint" {
            return Err(parser.error(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported definition <{}>; only <Blueprint> is allowed",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push(parser.blueprint(child)?);
    }
    Ok(defs)
}

impl<'a, 'input> Parser<'a, 'input> {
    fn blueprint(&self, node: Node<'_, '_>) -> Result<BlueprintDef, ContentCompileError> {
        self.allow_attributes(node, &["name", "kind"])?;
        let name = self.required_attribute(node, "name")?;
        let kind = match node.attribute("kind").map(str::trim) {
            Some("") => {
                return Err(self.error(
                    ContentErrorCode::MissingField,
                    "attribute kind must not be empty".to_string(),
                    node,
                ))
            }
            other => other.map(str::to_string),
        };

        let mut def = BlueprintDef {
            name,
            kind,
            default_facing: None,
            default_action: None,
            animate_when_idle: None,
            numbers: Vec::new(),
            texts: Vec::new(),
            flags: Vec::new(),
            animations: Vec::new(),
            origin: self.origin(node),
        };
        let mut seen_fields = HashSet::<String>::new();
        let mut seen_values = HashSet::<(String, String)>::new();
        let mut seen_animations = HashSet::<(Facing, String)>::new();

        for field in node.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name();
            match field_name {
                "defaultFacing" | "defaultAction" | "animateWhenIdle" => {
                    if !seen_fields.insert(field_name.to_string()) {
                        return Err(self.error(
                            ContentErrorCode::DuplicateField,
                            format!("duplicate field <{field_name}> in <Blueprint>"),
                            field,
                        ));
                    }
                    let value = self.required_text(field, field_name)?;
                    match field_name {
                        "defaultFacing" => {
                            def.default_facing = Some(self.facing(field, &value)?);
                        }
                        "defaultAction" => def.default_action = Some(value),
                        _ => def.animate_when_idle = Some(self.boolean(field, &value)?),
                    }
                }
                "data" | "text" | "flag" => {
                    self.allow_attributes(field, &["name"])?;
                    let value_name = self.required_attribute(field, "name")?;
                    if !seen_values.insert((field_name.to_string(), value_name.clone())) {
                        return Err(self.error(
                            ContentErrorCode::DuplicateField,
                            format!("duplicate <{field_name} name=\"{value_name}\">"),
                            field,
                        ));
                    }
                    match field_name {
                        "data" => {
                            let value = self.required_text(field, field_name)?;
                            def.numbers.push((value_name, self.number(field, &value)?));
                        }
                        "text" => {
                            let value = field.text().unwrap_or_default().to_string();
                            def.texts.push((value_name, value));
                        }
                        _ => {
                            let value = self.required_text(field, field_name)?;
                            def.flags.push((value_name, self.boolean(field, &value)?));
                        }
                    }
                }
                "animation" => {
                    let animation = self.animation(field)?;
                    if !seen_animations.insert((animation.facing, animation.action.clone())) {
                        return Err(self.error(
                            ContentErrorCode::DuplicateField,
                            format!(
                                "duplicate animation for facing {} and action {}",
                                animation.facing.as_str(),
                                animation.action
                            ),
                            field,
                        ));
                    }
                    def.animations.push(animation);
                }
                _ => {
                    return Err(self.error(
                        ContentErrorCode::UnknownField,
                        format!("unknown field <{field_name}> in <Blueprint>"),
                        field,
                    ))
                }
            }
        }
        Ok(def)
    }

    fn animation(&self, node: Node<'_, '_>) -> Result<AnimationDef, ContentCompileError> {
        self.allow_attributes(node, &["facing", "action"])?;
        let facing = self.required_attribute(node, "facing")?;
        let facing = self.facing(node, &facing)?;
        let action = self.required_attribute(node, "action")?;

        let mut frames = Vec::new();
        for child in node.children().filter(|child| child.is_element()) {
            if child.tag_name().name() != "frame" {
                return Err(self.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{}> in <animation>", child.tag_name().name()),
                    child,
                ));
            }
            frames.push(self.frame(child)?);
        }
        if frames.is_empty() {
            return Err(self.error(
                ContentErrorCode::MissingField,
                "<animation> needs at least one <frame>".to_string(),
                node,
            ));
        }
        Ok(AnimationDef {
            facing,
            action,
            frames,
        })
    }

    fn frame(&self, node: Node<'_, '_>) -> Result<FrameDef, ContentCompileError> {
        self.allow_attributes(node, &["fill", "width", "height"])?;
        let key = node.text().map(str::trim).unwrap_or_default();
        let source = match node.attribute("fill") {
            Some(_) if !key.is_empty() => {
                return Err(self.error(
                    ContentErrorCode::InvalidValue,
                    "<frame> takes either a file key or a fill colour, not both".to_string(),
                    node,
                ))
            }
            Some(fill) => {
                let color = match fill.trim().parse::<u8>() {
                    Ok(index) if index < PALETTE_SIZE => Color(index),
                    _ => {
                        return Err(self.error(
                            ContentErrorCode::InvalidValue,
                            format!("fill '{fill}' must be a palette index from 0 to 15"),
                            node,
                        ))
                    }
                };
                FrameSource::Fill {
                    color,
                    width: self.dimension(node, "width")?,
                    height: self.dimension(node, "height")?,
                }
            }
            None if key.is_empty() => {
                return Err(self.error(
                    ContentErrorCode::MissingField,
                    "<frame> needs a file key or a fill colour".to_string(),
                    node,
                ))
            }
            None => {
                if node.has_attribute("width") || node.has_attribute("height") {
                    return Err(self.error(
                        ContentErrorCode::InvalidValue,
                        "width and height only apply to fill frames".to_string(),
                        node,
                    ));
                }
                validate_asset_key(key).map_err(|error| {
                    self.error(
                        ContentErrorCode::InvalidValue,
                        format!("invalid frame key '{key}': {error}"),
                        node,
                    )
                })?;
                FrameSource::File(key.to_string())
            }
        };
        Ok(FrameDef {
            source,
            origin: self.origin(node),
        })
    }

    fn dimension(&self, node: Node<'_, '_>, name: &str) -> Result<u32, ContentCompileError> {
        let Some(raw) = node.attribute(name) else {
            return Ok(DEFAULT_IMAGE_SIZE);
        };
        match raw.trim().parse::<u32>() {
            Ok(value) if (1..=MAX_FILL_SIZE).contains(&value) => Ok(value),
            _ => Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("{name} '{raw}' must be a whole number from 1 to {MAX_FILL_SIZE}"),
                node,
            )),
        }
    }

    fn facing(&self, node: Node<'_, '_>, value: &str) -> Result<Facing, ContentCompileError> {
        Facing::from_name(value).ok_or_else(|| {
            self.error(
                ContentErrorCode::InvalidValue,
                format!("invalid facing '{value}'; allowed values: Down, Up, Left, Right"),
                node,
            )
        })
    }

    fn boolean(&self, node: Node<'_, '_>, value: &str) -> Result<bool, ContentCompileError> {
        match value {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("'{value}' is not a boolean; use true or false"),
                node,
            )),
        }
    }

    fn number(&self, node: Node<'_, '_>, value: &str) -> Result<f32, ContentCompileError> {
        match value.parse::<f32>() {
            Ok(parsed) if parsed.is_finite() => Ok(parsed),
            _ => Err(self.error(
                ContentErrorCode::InvalidValue,
                format!("'{value}' is not a finite number"),
                node,
            )),
        }
    }

    fn allow_attributes(
        &self,
        node: Node<'_, '_>,
        allowed: &[&str],
    ) -> Result<(), ContentCompileError> {
        match node
            .attributes()
            .find(|attribute| !allowed.contains(&attribute.name()))
        {
            Some(attribute) => Err(self.error(
                ContentErrorCode::UnknownField,
                format!(
                    "unknown attribute {} on <{}>",
                    attribute.name(),
                    node.tag_name().name()
                ),
                node,
            )),
            None => Ok(()),
        }
    }

    fn required_attribute(
        &self,
        node: Node<'_, '_>,
        name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.attribute(name).map(str::trim).unwrap_or_default();
        if value.is_empty() {
            return Err(self.error(
                ContentErrorCode::MissingField,
                format!(
                    "missing required attribute {name} on <{}>",
                    node.tag_name().name()
                ),
                node,
            ));
        }
        Ok(value.to_string())
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn origin(&self, node: Node<'_, '_>) -> DefOrigin {
        DefOrigin {
            file_path: self.file_path.to_path_buf(),
            location: self.location(node),
        }
    }

    fn location(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    fn error(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location(node)),
        }
    }
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        file_path: path,
        location: None,
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    use super::*;
    use crate::app::{ActionKind, DataKey, HeadlessHost};

    fn setup_paths(root: &Path) -> AppPaths {
        let paths = AppPaths::from_root(root);
        fs::create_dir_all(&paths.blueprints_dir).expect("blueprints dir");
        paths
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn compile_one(xml: &str) -> Result<BlueprintDatabase, ContentCompileError> {
        let temp = TempDir::new().expect("temp");
        let paths = setup_paths(temp.path());
        write_file(&paths.blueprints_dir.join("defs.xml"), xml);
        compile_blueprint_database(&paths.blueprints_dir)
    }

    const HERO: &str = r#"<Blueprints>
        <Blueprint name="hero" kind="Player">
            <defaultFacing>Left</defaultFacing>
            <defaultAction>Walk</defaultAction>
            <animateWhenIdle>true</animateWhenIdle>
            <data name="Life">5</data>
            <data name="Mana">12.5</data>
            <text name="Title">Knight</text>
            <flag name="Boss">true</flag>
            <animation facing="Left" action="Walk">
                <frame>hero/walk_left_0.png</frame>
                <frame fill="7" width="8" height="4"/>
            </animation>
        </Blueprint>
        <Blueprint name="rock"/>
    </Blueprints>"#;

    #[test]
    fn parses_every_field_of_a_blueprint() {
        let database = compile_one(HERO).expect("compile");
        assert_eq!(database.len(), 2);
        let hero = database.def("hero").expect("hero");
        assert_eq!(hero.kind.as_deref(), Some("Player"));
        assert_eq!(hero.default_facing, Some(Facing::Left));
        assert_eq!(hero.default_action.as_deref(), Some("Walk"));
        assert_eq!(hero.animate_when_idle, Some(true));
        assert_eq!(
            hero.numbers,
            [("Life".to_string(), 5.0), ("Mana".to_string(), 12.5)]
        );
        assert_eq!(hero.texts, [("Title".to_string(), "Knight".to_string())]);
        assert_eq!(hero.flags, [("Boss".to_string(), true)]);
        let frames = &hero.animations[0].frames;
        assert_eq!(
            frames[0].source,
            FrameSource::File("hero/walk_left_0.png".to_string())
        );
        assert_eq!(
            frames[1].source,
            FrameSource::Fill {
                color: Color(7),
                width: 8,
                height: 4
            }
        );
        assert_eq!(database.def("rock").and_then(|rock| rock.kind.clone()), None);
    }

    #[test]
    fn installs_blueprints_and_registers_new_names() {
        let temp = TempDir::new().expect("temp");
        let paths = setup_paths(temp.path());
        write_file(&paths.blueprints_dir.join("hero.xml"), HERO);
        let frame_path = paths.asset_dir.join("hero").join("walk_left_0.png");
        fs::create_dir_all(frame_path.parent().expect("parent")).expect("mkdir");
        RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255]))
            .save(&frame_path)
            .expect("png");

        let mut engine = Engine::default();
        assert_eq!(load_blueprints(&mut engine, &paths).expect("load"), 2);

        let mana = engine.data_names().lookup("Mana").expect("Mana registered");
        let title = engine.data_names().lookup("Title").expect("Title registered");
        let player = engine.sprite_kinds().lookup("Player").expect("Player kind");
        let hero = engine.get_blueprint("hero").expect("hero");
        assert_eq!(hero.kind(), player);
        assert_eq!(hero.default_facing(), Facing::Left);
        assert_eq!(hero.default_action(), ActionKind::WALK);
        assert!(hero.animate_when_idle());
        assert_eq!(hero.data_value(DataKey::LIFE), 5.0);
        assert_eq!(hero.data_value(DataKey::SPEED), 100.0);
        assert_eq!(hero.data_value(mana), 12.5);
        assert_eq!(hero.text_value(title), "Knight");
        let frames = hero.images(Facing::Left, ActionKind::WALK);
        assert_eq!(frames.len(), 2);
        assert_eq!((frames[0].width(), frames[0].height()), (3, 2));
        assert_eq!((frames[1].width(), frames[1].height()), (8, 4));
        assert_ne!(engine.get_blueprint("rock").expect("rock").kind(), player);

        let mut host = HeadlessHost::new();
        engine.create_screen("level");
        engine.set_current_screen("level", &mut host);
        assert!(engine.create_game_object("hero", &mut host).is_some());
    }

    #[test]
    fn missing_frame_file_is_an_image_load_error() {
        let temp = TempDir::new().expect("temp");
        let paths = setup_paths(temp.path());
        write_file(&paths.blueprints_dir.join("hero.xml"), HERO);

        let mut engine = Engine::default();
        let err = load_blueprints(&mut engine, &paths).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::ImageLoad);
        assert!(err.file_path.ends_with("hero.xml"));
        assert!(err.location.is_some());
        assert!(engine.get_blueprint("rock").is_none());
    }

    #[test]
    fn files_load_in_path_order_and_names_are_unique() {
        let temp = TempDir::new().expect("temp");
        let paths = setup_paths(temp.path());
        write_file(
            &paths.blueprints_dir.join("b.xml"),
            r#"<Blueprints><Blueprint name="second"/></Blueprints>"#,
        );
        write_file(
            &paths.blueprints_dir.join("a.xml"),
            r#"<Blueprints><Blueprint name="first"/></Blueprints>"#,
        );
        let database = compile_blueprint_database(&paths.blueprints_dir).expect("compile");
        let names = database.defs().iter().map(|def| def.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["first", "second"]);

        write_file(
            &paths.blueprints_dir.join("c.xml"),
            r#"<Blueprints><Blueprint name="first"/></Blueprints>"#,
        );
        let err = compile_blueprint_database(&paths.blueprints_dir).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateBlueprint);
        assert!(err.file_path.ends_with("c.xml"));
    }

    #[test]
    fn structural_errors_carry_codes_and_locations() {
        let cases = [
            (r#"<Defs/>"#, ContentErrorCode::InvalidRoot),
            (
                r#"<Blueprints><EntityDef/></Blueprints>"#,
                ContentErrorCode::UnknownDefType,
            ),
            (
                r#"<Blueprints><Blueprint kind="Enemy"/></Blueprints>"#,
                ContentErrorCode::MissingField,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><mood>Happy</mood></Blueprint></Blueprints>"#,
                ContentErrorCode::UnknownField,
            ),
            (
                r#"<Blueprints><Blueprint name="a" colour="red"/></Blueprints>"#,
                ContentErrorCode::UnknownField,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><data name="Life">1</data><data name="Life">2</data></Blueprint></Blueprints>"#,
                ContentErrorCode::DuplicateField,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><defaultFacing>North</defaultFacing></Blueprint></Blueprints>"#,
                ContentErrorCode::InvalidValue,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><data name="Life">lots</data></Blueprint></Blueprints>"#,
                ContentErrorCode::InvalidValue,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><animation facing="Up" action="Walk"/></Blueprint></Blueprints>"#,
                ContentErrorCode::MissingField,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><animation facing="Up" action="Walk"><frame>../x.png</frame></animation></Blueprint></Blueprints>"#,
                ContentErrorCode::InvalidValue,
            ),
            (
                r#"<Blueprints><Blueprint name="a"><animation facing="Up" action="Walk"><frame fill="16"/></animation></Blueprint></Blueprints>"#,
                ContentErrorCode::InvalidValue,
            ),
        ];
        for (xml, code) in cases {
            let err = compile_one(xml).expect_err(xml);
            assert_eq!(err.code, code, "xml={xml}");
            assert!(err.location.is_some(), "xml={xml}");
        }
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = compile_one(r#"<Blueprints><Blueprint name="a"></Blueprints>"#).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn missing_directory_is_a_discovery_error() {
        let temp = TempDir::new().expect("temp");
        let err = compile_blueprint_database(&temp.path().join("missing")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::Discovery);
        assert!(err.to_string().starts_with("Discovery: "));
    }
}
