use super::keyed_table::KeyedTable;

/// Token stored in a [`NamedValues`] registry.
pub trait NamedToken: Copy + PartialEq {
    fn from_raw(raw: u32) -> Self;
    fn raw(self) -> u32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataKey(pub u32);

impl DataKey {
    pub const LIFE: Self = Self(0);
    pub const DAMAGE: Self = Self(1);
    pub const SCORE: Self = Self(2);
    pub const SPEED: Self = Self(3);
    pub const ANIMATE_RATE: Self = Self(4);
    pub const DAMAGE_COOLDOWN: Self = Self(5);
    pub const ATTACK_COOLDOWN: Self = Self(6);
    pub const ATTACK_DURATION: Self = Self(7);

    pub const BUILTIN: [(&'static str, Self); 8] = [
        ("Life", Self::LIFE),
        ("Damage", Self::DAMAGE),
        ("Score", Self::SCORE),
        ("Speed", Self::SPEED),
        ("AnimateRate", Self::ANIMATE_RATE),
        ("DamageCooldown", Self::DAMAGE_COOLDOWN),
        ("AttackCooldown", Self::ATTACK_COOLDOWN),
        ("AttackDuration", Self::ATTACK_DURATION),
    ];

    /// Values that count down by the frame time on every update.
    pub const TIMERS: [Self; 3] = [
        Self::DAMAGE_COOLDOWN,
        Self::ATTACK_COOLDOWN,
        Self::ATTACK_DURATION,
    ];
}

impl NamedToken for DataKey {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionKind(pub u32);

impl ActionKind {
    pub const NONE: Self = Self(0);
    pub const WALK: Self = Self(1);
    pub const RUN: Self = Self(2);
    pub const ATTACK: Self = Self(3);
    pub const DAMAGE: Self = Self(4);
    pub const DEATH: Self = Self(5);

    pub const BUILTIN: [(&'static str, Self); 6] = [
        ("None", Self::NONE),
        ("Walk", Self::WALK),
        ("Run", Self::RUN),
        ("Attack", Self::ATTACK),
        ("Damage", Self::DAMAGE),
        ("Death", Self::DEATH),
    ];
}

impl NamedToken for ActionKind {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

/// Host sprite-kind token. Issued by [`SpriteKindRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteKind(pub u32);

impl NamedToken for SpriteKind {
    fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    fn raw(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    #[default]
    Down,
    Up,
    Left,
    Right,
}

impl Facing {
    pub const ALL: [Self; 4] = [Self::Down, Self::Up, Self::Left, Self::Right];

    pub const fn index(self) -> usize {
        match self {
            Self::Down => 0,
            Self::Up => 1,
            Self::Left => 2,
            Self::Right => 3,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Down" => Some(Self::Down),
            "Up" => Some(Self::Up),
            "Left" => Some(Self::Left),
            "Right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Down => "Down",
            Self::Up => "Up",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// Name to token registry. Ids are handed out in increasing order and never
/// reused, so a token stays valid for the lifetime of the registry.
#[derive(Debug, Clone)]
pub struct NamedValues<T> {
    by_name: KeyedTable<String, T>,
    next: u32,
}

impl<T: NamedToken> NamedValues<T> {
    pub fn empty() -> Self {
        Self {
            by_name: KeyedTable::new(),
            next: 0,
        }
    }

    pub fn with_builtins(builtins: &[(&str, T)]) -> Self {
        let mut registry = Self::empty();
        for (name, token) in builtins {
            registry.by_name.set((*name).to_string(), *token);
            registry.next = registry.next.max(token.raw() + 1);
        }
        registry
    }

    /// Returns the token for `name`, issuing a fresh one on first use.
    pub fn register(&mut self, name: &str) -> T {
        if let Some(existing) = self.lookup(name) {
            return existing;
        }
        let token = self.issue();
        self.by_name.set(name.to_string(), token);
        token
    }

    /// Issues an anonymous token.
    pub fn issue(&mut self) -> T {
        let token = T::from_raw(self.next);
        self.next = self.next.saturating_add(1);
        token
    }

    pub fn lookup(&self, name: &str) -> Option<T> {
        self.by_name
            .iter()
            .find(|(candidate, _)| candidate.as_str() == name)
            .map(|(_, token)| *token)
    }

    pub fn name_of(&self, token: T) -> Option<&str> {
        self.by_name
            .iter()
            .find(|(_, candidate)| **candidate == token)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

pub type DataNames = NamedValues<DataKey>;
pub type ActionNames = NamedValues<ActionKind>;
pub type SpriteKindRegistry = NamedValues<SpriteKind>;

impl Default for DataNames {
    fn default() -> Self {
        Self::with_builtins(&DataKey::BUILTIN)
    }
}

impl Default for ActionNames {
    fn default() -> Self {
        Self::with_builtins(&ActionKind::BUILTIN)
    }
}

impl Default for SpriteKindRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
