#![no_main]
use libfuzzer_sys::fuzz_target;
use reqparse::{Normalizer, XmlParser};

fuzz_target!(|data: &[u8]| {
    if let Ok(document) = XmlParser::new(data).parse() {
        let _ = Normalizer::default().normalize_element(&document.root);
    }
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = reqparse::from_xml_str(s);
    }
});
