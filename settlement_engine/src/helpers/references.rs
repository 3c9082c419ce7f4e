use rand::{distributions::Alphanumeric, Rng};

const REFERENCE_LENGTH: usize = 12;

fn random_reference(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFERENCE_LENGTH)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("{prefix}-{suffix}")
}

/// A human-readable order reference, e.g. `ORD-7K2D9QX4LM0P`.
pub fn new_order_reference() -> String {
    random_reference("ORD")
}

/// The correlation reference sent to the charge gateway and echoed back in its callback.
pub fn new_payment_reference() -> String {
    random_reference("PAY")
}

pub fn new_payout_reference() -> String {
    random_reference("PO")
}
