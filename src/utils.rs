use byte_unit::{Byte, UnitType};

pub fn format_size(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.2}", adjusted)
}

pub fn format_size_with(bytes: u64, raw: bool) -> String {
    if raw {
        format!("{} B", bytes)
    } else {
        format_size(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size_with(2048, true), "2048 B");
        assert!(format_size(3 * 1024 * 1024).starts_with("3.00"));
    }
}
