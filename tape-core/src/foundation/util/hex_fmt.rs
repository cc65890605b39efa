use std::fmt;

/// Hex formatter for arbitrary bytes, used to keep large payloads out of log lines.
///
/// `{}` prints the full lowercase hex; `{:#}` prints only the first eight bytes.
#[derive(Clone, Copy)]
pub struct HexBytes<'a>(pub &'a [u8]);

pub fn hx(bytes: &[u8]) -> HexBytes<'_> {
    HexBytes(bytes)
}

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if f.alternate() { &self.0[..self.0.len().min(8)] } else { self.0 };
        for b in shown {
            write!(f, "{:02x}", b)?;
        }
        if f.alternate() && self.0.len() > shown.len() {
            f.write_str("..")?;
        }
        Ok(())
    }
}
