#![no_main]
use libfuzzer_sys::fuzz_target;
use reqparse::Format;

fuzz_target!(|data: &[u8]| {
    for format in Format::ALL {
        let _ = reqparse::PayloadParser::default().parse_as(format, data);
    }
});
