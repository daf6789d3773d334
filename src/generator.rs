use std::path::Path;

use rand::Rng;

use crate::config::TextEncoding;
use crate::viewport::FIELD_SIZE;

pub const RAW_NO_OBJECT: f64 = 9999.0;
const RAW_MAX_DISTANCE: f64 = 2000.0;

pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Ascii => text.as_bytes().to_vec(),
        TextEncoding::Utf16 => [0xFF, 0xFE]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect(),
        TextEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SampleGenerator {
    fields: usize,
    encoding: TextEncoding,
}

impl SampleGenerator {
    pub fn new(fields: usize, encoding: TextEncoding) -> Self {
        Self { fields, encoding }
    }

    pub fn random_line<R: Rng>(&self, rng: &mut R) -> String {
        let x = rng.gen_range(0.0..FIELD_SIZE);
        let y = rng.gen_range(0.0..FIELD_SIZE);
        let theta = rng.gen_range(-180.0..180.0);
        let mut line = format!("{:.2}, {:.2}, {:.2}", x, y, theta);

        if self.fields == 5 {
            let mut raw = || {
                if rng.gen_bool(0.1) {
                    RAW_NO_OBJECT
                } else {
                    rng.gen_range(0.0..RAW_MAX_DISTANCE)
                }
            };
            let (right, left) = (raw(), raw());
            line.push_str(&format!(", {:.2}, {:.2}", right, left));
        }
        line
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<String> {
        let line = self.random_line(&mut rand::thread_rng());
        std::fs::write(path, encode(&line, self.encoding))?;
        log::info!("wrote test sample '{}' to '{}'", line, path.display());
        Ok(line)
    }
}
