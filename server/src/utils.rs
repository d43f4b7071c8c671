use rand::Rng;

const LOBBY_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CLIENT_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const LOBBY_ID_LENGTH: usize = 6;
pub const CLIENT_ID_LENGTH: usize = 8;

// Short uppercase code players type in to join
pub fn generate_lobby_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_code(rng, LOBBY_ID_ALPHABET, LOBBY_ID_LENGTH)
}

// Identity handed to a fresh connection until it claims a previous one
pub fn generate_client_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    random_code(rng, CLIENT_ID_ALPHABET, CLIENT_ID_LENGTH)
}

fn random_code<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> String {
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
