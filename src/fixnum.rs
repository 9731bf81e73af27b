//! The Marshal variable-length signed integer encoding.
//!
//! A control byte selects the form: `0x00` is zero, `0x01`–`0x04` introduce
//! 1–4 little-endian payload bytes for positive values, `0xff`–`0xfc` the
//! negative counterparts, and any other byte is itself a small integer
//! biased by 5 so that single-byte values skip the control codes. The
//! negative multi-byte forms special-case an all-zero payload; those results
//! (−65536, −16777215, −4294967295) are the format's documented quirk and
//! are reproduced exactly.

use crate::cursor::Cursor;
use crate::error::MarshalError;

/// Decodes one length/index/integer value from the stream.
pub fn read_fixnum(cursor: &mut Cursor<'_>) -> Result<i64, MarshalError> {
    let control = cursor.read_u8()?;
    match control {
        0x00 => Ok(0),
        0x01..=0x04 => {
            let n = control as usize;
            let mut v: i64 = 0;
            for (i, b) in cursor.read_exact(n)?.iter().enumerate() {
                v |= i64::from(*b) << (8 * i);
            }
            Ok(v)
        }
        0xff => {
            let x = i64::from(cursor.read_u8()?);
            Ok(-x - 1)
        }
        0xfc..=0xfe => {
            let n = 0x100 - control as usize;
            let mut v: i64 = 0;
            for (i, b) in cursor.read_exact(n)?.iter().enumerate() {
                v |= i64::from(*b) << (8 * i);
            }
            if v == 0 {
                // All-zero payloads decode to these exact constants.
                return Ok(match n {
                    2 => -65_536,
                    3 => -16_777_215,
                    _ => -4_294_967_295,
                });
            }
            let mask = (1i64 << (8 * n)) - 1;
            Ok(-((!v + 1) & mask))
        }
        _ => {
            let c = i64::from(control as i8);
            if c > 0 { Ok(c - 5) } else { Ok(c + 5) }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> i64 {
        let mut cursor = Cursor::new(bytes);
        let v = read_fixnum(&mut cursor).unwrap();
        assert_eq!(cursor.remaining(), 0, "codec left bytes unconsumed");
        v
    }

    #[test]
    fn zero() {
        assert_eq!(decode(&[0x00]), 0);
    }

    #[test]
    fn single_byte_biased() {
        assert_eq!(decode(&[0x06]), 1);
        assert_eq!(decode(&[0xfa]), -1);
        assert_eq!(decode(&[0x7f]), 122); // largest single-byte positive
        assert_eq!(decode(&[0x80]), -123); // smallest single-byte negative
    }

    #[test]
    fn one_payload_byte() {
        assert_eq!(decode(&[0x01, 0x7b]), 123);
        assert_eq!(decode(&[0x01, 0xff]), 255);
        assert_eq!(decode(&[0xff, 0xff]), -256); // −X − 1
        assert_eq!(decode(&[0xff, 0x00]), -1);
    }

    #[test]
    fn two_payload_bytes() {
        assert_eq!(decode(&[0x02, 0x00, 0x01]), 256);
        assert_eq!(decode(&[0x02, 0xff, 0xff]), 65_535);
        assert_eq!(decode(&[0xfe, 0x00, 0xff]), -256);
        assert_eq!(decode(&[0xfe, 0x01, 0x00]), -65_535);
    }

    #[test]
    fn two_byte_all_zero_special_case() {
        assert_eq!(decode(&[0xfe, 0x00, 0x00]), -65_536);
    }

    #[test]
    fn three_payload_bytes() {
        assert_eq!(decode(&[0x03, 0x00, 0x00, 0x01]), 65_536);
        assert_eq!(decode(&[0x03, 0xff, 0xff, 0xff]), 16_777_215);
        assert_eq!(decode(&[0xfd, 0x01, 0x00, 0x00]), -16_777_215);
        assert_eq!(decode(&[0xfd, 0x00, 0x00, 0x00]), -16_777_215);
    }

    #[test]
    fn four_payload_bytes() {
        assert_eq!(decode(&[0x04, 0x00, 0x00, 0x00, 0x01]), 16_777_216);
        assert_eq!(decode(&[0x04, 0xff, 0xff, 0xff, 0x7f]), 2_147_483_647);
        assert_eq!(decode(&[0xfc, 0x00, 0x00, 0x00, 0x80]), -2_147_483_648);
        assert_eq!(decode(&[0xfc, 0x01, 0x00, 0x00, 0x00]), -4_294_967_295);
        assert_eq!(decode(&[0xfc, 0x00, 0x00, 0x00, 0x00]), -4_294_967_295);
    }

    #[test]
    fn truncated_payload() {
        let mut cursor = Cursor::new(&[0x02, 0x01]);
        assert!(matches!(
            read_fixnum(&mut cursor),
            Err(MarshalError::TruncatedInput { .. })
        ));
    }
}
