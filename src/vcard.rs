//! vCard 3.0 payload for the QR code on the back of the card.

use crate::contact::ContactRecord;

/// Encode a contact as a vCard 3.0 text block.
///
/// Every line is always emitted, empty fields leave an empty value. The only
/// transformation applied is splitting the address at commas so each part
/// lands in its own `ADR` component.
pub fn encode(record: &ContactRecord) -> String {
    let lines = [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{};;;", record.last_name, record.first_name),
        format!("FN:{} {}", record.first_name, record.last_name),
        format!("ORG:{}", record.company),
        format!("TITLE:{}", record.position),
        format!("TEL;WORK:{}", record.phone),
        format!("TEL;FAX:{}", record.fax),
        format!("EMAIL:{}", record.email),
        format!("ADR;WORK:;;{}", address_components(&record.address)),
        format!("URL:{}", record.website),
        "END:VCARD".to_string(),
    ];
    lines.join("\n")
}

/// Split the address at commas into `ADR` components, dropping the blank
/// that usually follows each comma.
fn address_components(address: &str) -> String {
    address
        .split(',')
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join(";")
}
