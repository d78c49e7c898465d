//! Fuzz testing for the type descriptor parser.
//!
//! Arbitrary descriptor text must either parse into a blueprint whose
//! rendering parses back to the same blueprint, or fail with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;

use colwire::types::parse_descriptor;

fuzz_target!(|descriptor: &str| {
    if descriptor.len() > 4096 {
        return;
    }

    if let Ok(blueprint) = parse_descriptor(descriptor) {
        let rendered = blueprint.to_string();
        let reparsed = parse_descriptor(&rendered).expect("rendered blueprint must parse");
        assert_eq!(blueprint, reparsed);
    }
});
