use super::keyed_table::KeyedTable;
use super::named_values::DataKey;

/// Numeric, text and flag values keyed by [`DataKey`].
///
/// Blueprints hold the template bank; every game object clones it at spawn
/// so instances mutate independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataBank {
    pub numbers: KeyedTable<DataKey, f32>,
    pub texts: KeyedTable<DataKey, String>,
    pub flags: KeyedTable<DataKey, bool>,
}

impl DataBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_stats() -> Self {
        let mut bank = Self::new();
        bank.numbers.set(DataKey::LIFE, 3.0);
        bank.numbers.set(DataKey::DAMAGE, 0.0);
        bank.numbers.set(DataKey::SCORE, 0.0);
        bank.numbers.set(DataKey::SPEED, 100.0);
        bank.numbers.set(DataKey::ANIMATE_RATE, 50.0);
        bank.numbers.set(DataKey::DAMAGE_COOLDOWN, 1000.0);
        bank.numbers.set(DataKey::ATTACK_COOLDOWN, 0.0);
        bank.numbers.set(DataKey::ATTACK_DURATION, 300.0);
        bank
    }

    pub fn number(&self, key: DataKey) -> f32 {
        self.numbers.get(&key).copied().unwrap_or(0.0)
    }

    pub fn set_number(&mut self, key: DataKey, value: f32) {
        self.numbers.set(key, value);
    }

    pub fn text(&self, key: DataKey) -> &str {
        self.texts.get(&key).map(String::as_str).unwrap_or("")
    }

    pub fn set_text(&mut self, key: DataKey, value: impl Into<String>) {
        self.texts.set(key, value.into());
    }

    pub fn flag(&self, key: DataKey) -> bool {
        self.flags.get(&key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: DataKey, value: bool) {
        self.flags.set(key, value);
    }

    pub fn copy_into(&self, other: &mut DataBank) {
        self.numbers.copy_into(&mut other.numbers);
        self.texts.copy_into(&mut other.texts);
        self.flags.copy_into(&mut other.flags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: DataKey = DataKey(20);
    const BOSS: DataKey = DataKey(21);

    #[test]
    fn absent_keys_read_as_zero_values() {
        let bank = DataBank::new();
        assert_eq!(bank.number(DataKey::LIFE), 0.0);
        assert_eq!(bank.text(TITLE), "");
        assert!(!bank.flag(BOSS));
    }

    #[test]
    fn default_stats_match_template_values() {
        let bank = DataBank::with_default_stats();
        assert_eq!(bank.number(DataKey::LIFE), 3.0);
        assert_eq!(bank.number(DataKey::SPEED), 100.0);
        assert_eq!(bank.number(DataKey::ANIMATE_RATE), 50.0);
        assert_eq!(bank.number(DataKey::DAMAGE_COOLDOWN), 1000.0);
        assert_eq!(bank.number(DataKey::ATTACK_DURATION), 300.0);
    }

    #[test]
    fn mutating_clone_leaves_original_untouched() {
        let mut original = DataBank::with_default_stats();
        original.set_text(TITLE, "knight");
        original.set_flag(BOSS, false);

        let mut clone = original.clone();
        clone.set_number(DataKey::LIFE, 99.0);
        clone.set_text(TITLE, "squire");
        clone.set_flag(BOSS, true);
        clone.set_number(DataKey(30), 1.0);

        assert_eq!(original.number(DataKey::LIFE), 3.0);
        assert_eq!(original.text(TITLE), "knight");
        assert!(!original.flag(BOSS));
        assert!(!original.numbers.contains(&DataKey(30)));
    }

    #[test]
    fn copy_into_merges_all_three_tables() {
        let mut source = DataBank::new();
        source.set_number(DataKey::SCORE, 5.0);
        source.set_text(TITLE, "mage");
        source.set_flag(BOSS, true);
        let mut target = DataBank::with_default_stats();

        source.copy_into(&mut target);

        assert_eq!(target.number(DataKey::SCORE), 5.0);
        assert_eq!(target.number(DataKey::LIFE), 3.0);
        assert_eq!(target.text(TITLE), "mage");
        assert!(target.flag(BOSS));
    }
}
