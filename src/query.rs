//! Search-expression construction for the field-values endpoint.

/// A composed clinicaltrials.gov search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression(String);

impl FilterExpression {
    /// The raw, unencoded expression.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The expression encoded for use as the `expr` query parameter.
    pub fn percent_encoded(&self) -> String {
        percent_encode(&self.0)
    }
}

/// Build the location, status and lead-sponsor filter for one sponsor.
///
/// Values are interpolated verbatim; only the finished expression is
/// percent-encoded.
pub fn build_filter_expression(sponsor: &str, status: &str, location: &str) -> FilterExpression {
    FilterExpression(format!(
        "AREA[LocationFacility]{} AND AREA[OverallStatus]{} AND AREA[LeadSponsorName]{}",
        location, status, sponsor
    ))
}

/// Percent-encode every byte outside `A-Z a-z 0-9 _ . - ~ /`.
pub fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 3);
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_decode(input: &str) -> String {
        let bytes = input.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap();
                out.push(u8::from_str_radix(hex, 16).unwrap());
                i += 3;
            } else {
                out.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_expression_template() {
        let expr = build_filter_expression("NINDS", "Completed", "NIH Clinical Center");
        assert_eq!(
            expr.as_str(),
            "AREA[LocationFacility]NIH Clinical Center AND AREA[OverallStatus]Completed AND AREA[LeadSponsorName]NINDS"
        );
    }

    #[test]
    fn test_encoded_expression_decodes_to_original() {
        let cases = [
            ("NCI", "Completed", "NIH Clinical Center"),
            ("Children's Oncology Group", "Active, not recruiting", "Mayo Clinic"),
            ("Hôpital Necker", "Terminated", "Paris & Île-de-France"),
        ];

        for (sponsor, status, location) in cases {
            let expr = build_filter_expression(sponsor, status, location);
            let encoded = expr.percent_encoded();
            assert!(!encoded.contains(' '));
            assert_eq!(
                percent_decode(&encoded),
                format!(
                    "AREA[LocationFacility]{} AND AREA[OverallStatus]{} AND AREA[LeadSponsorName]{}",
                    location, status, sponsor
                )
            );
        }
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        assert_eq!(
            percent_encode("AREA[OverallStatus]Not yet recruiting"),
            "AREA%5BOverallStatus%5DNot%20yet%20recruiting"
        );
        assert_eq!(percent_encode("a&b=c+d"), "a%26b%3Dc%2Bd");
        assert_eq!(percent_encode("safe-_.~/"), "safe-_.~/");
    }

    #[test]
    fn test_multibyte_characters_encode_per_byte() {
        assert_eq!(percent_encode("é"), "%C3%A9");
    }
}
