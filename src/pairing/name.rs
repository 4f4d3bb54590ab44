//! Display names for paired mobile clients.

use rand::Rng;

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// Generate a four-letter display name, one capital followed by three
/// lowercase letters. Names are labels, not identifiers, so collisions
/// are fine.
pub fn allocate_name() -> String {
    let mut rng = rand::thread_rng();
    let mut name = String::with_capacity(4);

    name.push(UPPERCASE[rng.gen_range(0..UPPERCASE.len())] as char);
    for _ in 0..3 {
        name.push(LOWERCASE[rng.gen_range(0..LOWERCASE.len())] as char);
    }

    name
}
