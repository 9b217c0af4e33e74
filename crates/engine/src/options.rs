//! Instance configuration.
//!
//! Plain values deserialize from TOML; callbacks are attached in code through [`Callbacks`].

use std::fmt;
use std::sync::Arc;

use core_types::Millis;
use serde::{Deserialize, Deserializer};

use crate::action::Action;
use crate::instance::Instance;
use crate::queue::Queue;

/// A delay split into the part spent before a transition and the part spent after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "DelaySpec")]
pub struct Delay {
    pub before: Millis,
    pub after: Millis,
    pub total: Millis,
}

impl Delay {
    /// Half before, half after.
    pub const fn split(total: Millis) -> Self {
        Self {
            before: total / 2,
            after: total / 2,
            total,
        }
    }

    pub const fn pair(before: Millis, after: Millis) -> Self {
        Self {
            before,
            after,
            total: before.saturating_add(after),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DelaySpec {
    Total(Millis),
    Pair([Millis; 2]),
}

impl From<DelaySpec> for Delay {
    fn from(spec: DelaySpec) -> Self {
        match spec {
            DelaySpec::Total(total) => Delay::split(total),
            DelaySpec::Pair([before, after]) => Delay::pair(before, after),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    #[serde(deserialize_with = "one_or_many")]
    pub strings: Vec<String>,
    /// Type pace in milliseconds.
    pub speed: Millis,
    /// Delete pace; a third of `speed` when unset.
    pub delete_speed: Option<Millis>,
    /// Jitter each pace uniformly within half of its value.
    pub life_like: bool,
    pub cursor: bool,
    pub cursor_char: String,
    /// Blink period.
    pub cursor_speed: Millis,
    /// Keep earlier strings and start the next one on a new line instead of deleting.
    pub break_lines: bool,
    pub start_delay: Millis,
    /// Type pre-existing content instantly and delete it first.
    pub start_delete: bool,
    pub next_string_delay: Delay,
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Falls back to `next_string_delay`.
    pub loop_delay: Option<Delay>,
    pub html: bool,
    pub wait_until_visible: bool,
    /// Seed for life-like jitter; derived from the instance id when unset.
    pub jitter_seed: Option<u64>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strings: Vec::new(),
            speed: 100,
            delete_speed: None,
            life_like: true,
            cursor: true,
            cursor_char: "|".to_string(),
            cursor_speed: 1000,
            break_lines: true,
            start_delay: 250,
            start_delete: false,
            next_string_delay: Delay::split(750),
            looping: false,
            loop_delay: None,
            html: true,
            wait_until_visible: false,
            jitter_seed: None,
        }
    }
}

impl Options {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let options: Options = toml::from_str(input).map_err(ConfigError::Parse)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cursor && self.cursor_char.is_empty() {
            return Err(ConfigError::Invalid(
                "cursor_char must not be empty while the cursor is shown".to_string(),
            ));
        }
        Ok(())
    }

    pub fn delete_pace(&self) -> Millis {
        self.delete_speed.unwrap_or(self.speed / 3)
    }

    pub fn effective_loop_delay(&self) -> Delay {
        self.loop_delay.unwrap_or(self.next_string_delay)
    }

    pub fn apply(&mut self, patch: &OptionsPatch) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }
        set(&mut self.speed, &patch.speed);
        set(&mut self.life_like, &patch.life_like);
        set(&mut self.cursor, &patch.cursor);
        set(&mut self.cursor_char, &patch.cursor_char);
        set(&mut self.cursor_speed, &patch.cursor_speed);
        set(&mut self.break_lines, &patch.break_lines);
        set(&mut self.start_delay, &patch.start_delay);
        set(&mut self.start_delete, &patch.start_delete);
        set(&mut self.next_string_delay, &patch.next_string_delay);
        set(&mut self.looping, &patch.looping);
        set(&mut self.html, &patch.html);
        set(&mut self.wait_until_visible, &patch.wait_until_visible);
        if patch.delete_speed.is_some() {
            self.delete_speed = patch.delete_speed;
        }
        if patch.loop_delay.is_some() {
            self.loop_delay = patch.loop_delay;
        }
        if patch.jitter_seed.is_some() {
            self.jitter_seed = patch.jitter_seed;
        }
    }
}

/// A partial [`Options`] merged over the current values by a live update.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsPatch {
    pub speed: Option<Millis>,
    pub delete_speed: Option<Millis>,
    pub life_like: Option<bool>,
    pub cursor: Option<bool>,
    pub cursor_char: Option<String>,
    pub cursor_speed: Option<Millis>,
    pub break_lines: Option<bool>,
    pub start_delay: Option<Millis>,
    pub start_delete: Option<bool>,
    pub next_string_delay: Option<Delay>,
    #[serde(rename = "loop")]
    pub looping: Option<bool>,
    pub loop_delay: Option<Delay>,
    pub html: Option<bool>,
    pub wait_until_visible: Option<bool>,
    pub jitter_seed: Option<u64>,
}

impl OptionsPatch {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(ConfigError::Parse)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(err) => write!(f, "invalid options: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

/// Receives the triggering action, the queue, and the instance.
pub type StepCallback = Arc<dyn Fn(&Action, &Queue, &Instance) + Send + Sync>;
pub type CompleteCallback = Arc<dyn Fn(&Instance) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Callbacks {
    pub before_step: Option<StepCallback>,
    pub after_step: Option<StepCallback>,
    pub before_string: Option<StepCallback>,
    pub after_string: Option<StepCallback>,
    pub after_complete: Option<CompleteCallback>,
}

impl Callbacks {
    pub fn before_step(mut self, f: impl Fn(&Action, &Queue, &Instance) + Send + Sync + 'static) -> Self {
        self.before_step = Some(Arc::new(f));
        self
    }

    pub fn after_step(mut self, f: impl Fn(&Action, &Queue, &Instance) + Send + Sync + 'static) -> Self {
        self.after_step = Some(Arc::new(f));
        self
    }

    pub fn before_string(mut self, f: impl Fn(&Action, &Queue, &Instance) + Send + Sync + 'static) -> Self {
        self.before_string = Some(Arc::new(f));
        self
    }

    pub fn after_string(mut self, f: impl Fn(&Action, &Queue, &Instance) + Send + Sync + 'static) -> Self {
        self.after_string = Some(Arc::new(f));
        self
    }

    pub fn after_complete(mut self, f: impl Fn(&Instance) + Send + Sync + 'static) -> Self {
        self.after_complete = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("before_step", &self.before_step.is_some())
            .field("after_step", &self.after_step.is_some())
            .field("before_string", &self.before_string.is_some())
            .field("after_string", &self.after_string.is_some())
            .field("after_complete", &self.after_complete.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = Options::default();
        assert_eq!(options.speed, 100);
        assert_eq!(options.delete_pace(), 33);
        assert_eq!(options.next_string_delay, Delay::pair(375, 375));
        assert_eq!(options.effective_loop_delay().total, 750);
        assert!(options.life_like && options.cursor && options.break_lines && options.html);
        assert!(!options.looping && !options.start_delete && !options.wait_until_visible);
    }

    #[test]
    fn toml_accepts_single_string_and_delay_shapes() {
        let options = Options::from_toml_str(
            r#"
strings = "Hello"
speed = 40
next_string_delay = [100, 300]
loop = true
loop_delay = 1000
"#,
        )
        .expect("valid options");
        assert_eq!(options.strings, vec!["Hello".to_string()]);
        assert_eq!(options.speed, 40);
        assert_eq!(options.next_string_delay, Delay::pair(100, 300));
        assert_eq!(options.next_string_delay.total, 400);
        assert_eq!(options.loop_delay, Some(Delay::split(1000)));
        assert!(options.looping);
        assert_eq!(options.cursor_char, "|");
    }

    #[test]
    fn huge_delay_pairs_saturate() {
        let delay = Delay::pair(Millis::MAX, 1);
        assert_eq!(delay.total, Millis::MAX);
        assert_eq!(delay.before, Millis::MAX);
        assert_eq!(delay.after, 1);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_reported() {
        let err = Options::from_toml_str("sped = 4").expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");

        let err = Options::from_toml_str("cursor_char = \"\"").expect_err("empty cursor");
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("cursor_char"));

        assert!(Options::from_toml_str("cursor = false\ncursor_char = \"\"").is_ok());
    }

    #[test]
    fn patch_overrides_only_present_fields() {
        let mut options = Options::default();
        let patch = OptionsPatch::from_toml_str("speed = 10\ndelete_speed = 5\nloop = true")
            .expect("valid patch");
        options.apply(&patch);
        assert_eq!(options.speed, 10);
        assert_eq!(options.delete_pace(), 5);
        assert!(options.looping);
        assert_eq!(options.start_delay, 250);
    }
}
