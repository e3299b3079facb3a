#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(xml_content) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut doc) = kmz_cleaner::parse_kml(xml_content) else {
        return;
    };

    // Bereinigung darf auf keinem parsbaren Baum paniken
    kmz_cleaner::deduplicate_placemarks(&mut doc);
    let second = kmz_cleaner::deduplicate_placemarks(&mut doc);
    assert_eq!(second.removed, 0);

    let written = kmz_cleaner::write_kml(&doc);
    let _ = kmz_cleaner::parse_kml(&written);
});
