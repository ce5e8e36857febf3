use crate::error::{Result, X509KitError};

pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";
pub const CRL_LABEL: &str = "X509 CRL";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF))
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    Ok(pem.contents().to_vec())
}

/// Like [`pem_to_der`], but rejects a block whose label is not `label`.
pub fn pem_to_der_labeled(pem_str: &str, label: &str) -> Result<Vec<u8>> {
    let pem = pem::parse(pem_str)?;
    if pem.tag() != label {
        return Err(X509KitError::DecodingError(format!(
            "expected a {} PEM block, found {}",
            label,
            pem.tag()
        )));
    }
    Ok(pem.contents().to_vec())
}

/// Every PEM block in `input` as `(label, DER contents)`, in order.
pub fn pem_blocks(input: &[u8]) -> Result<Vec<(String, Vec<u8>)>> {
    Ok(pem::parse_many(input)?
        .into_iter()
        .map(|block| (block.tag().to_string(), block.into_contents()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_keep_labels_and_order() {
        let mut bundle = der_to_pem(&[0x30, 0x00], CERTIFICATE_LABEL);
        bundle.push_str(&der_to_pem(&[0x30, 0x03, 0x02, 0x01, 0x01], CRL_LABEL));
        let blocks = pem_blocks(bundle.as_bytes()).unwrap();
        assert_eq!(
            blocks,
            vec![
                (CERTIFICATE_LABEL.to_string(), vec![0x30, 0x00]),
                (CRL_LABEL.to_string(), vec![0x30, 0x03, 0x02, 0x01, 0x01]),
            ]
        );
    }

    #[test]
    fn label_mismatch_is_rejected() {
        let pem = der_to_pem(&[0x30, 0x00], CRL_LABEL);
        assert!(pem_to_der_labeled(&pem, CERTIFICATE_LABEL).is_err());
        assert_eq!(pem_to_der(&pem).unwrap(), vec![0x30, 0x00]);
    }
}
