#![no_main]
use libfuzzer_sys::fuzz_target;
use tlcp_sm2e::DisabledAlgorithms;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = core::str::from_utf8(data) else {
        return;
    };

    // Whatever parses must re-parse from its rendering to the same policy.
    if let Ok(policy) = input.parse::<DisabledAlgorithms>() {
        let rendered = policy.to_string();
        assert_eq!(rendered.parse::<DisabledAlgorithms>().unwrap(), policy);
    }
});
