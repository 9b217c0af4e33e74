#![no_main]

use libfuzzer_sys::fuzz_target;
use markup::{markup_to_units, unit_count};
use render::{Container, RenderTarget};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let units = markup_to_units(input);
    assert_eq!(units.len(), unit_count(input, true));

    let mut target = Container::new();
    for unit in &units {
        target.append(unit);
    }
    assert_eq!(target.char_count(), units.len());

    while target.remove_last().is_some() {}
    assert_eq!(target.char_count(), 0);
    assert!(target.tree().is_some_and(|tree| tree.is_empty()));
});
