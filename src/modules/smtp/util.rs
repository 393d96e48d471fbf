use rand::Rng;

use crate::utc_now;

pub fn generate_message_id(sender: &str) -> String {
    let random_bytes: [u8; 16] = rand::rng().random();
    let random_id = hex::encode(random_bytes);
    let domain = sender
        .rsplit_once('@')
        .map(|(_, domain)| domain)
        .filter(|domain| !domain.is_empty())
        .unwrap_or("bulkmailer");
    format!("{}.{}@{}", utc_now!(), random_id, domain)
}
