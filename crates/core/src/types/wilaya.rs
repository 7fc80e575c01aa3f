//! Province (wilaya) table with flat delivery costs.
//!
//! Delivery is priced per province, not per item or weight. The table is
//! indexed by the official province code (1-48).

use serde::Serialize;

use super::price::Price;

/// A province and its flat delivery cost in dinars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Wilaya {
    /// Official province code.
    pub code: u8,
    /// Display name, used as the order's `wilaya` column value.
    pub name: &'static str,
    shipping_dinars: i64,
}

impl Wilaya {
    const fn new(code: u8, name: &'static str, shipping_dinars: i64) -> Self {
        Self {
            code,
            name,
            shipping_dinars,
        }
    }

    /// Flat delivery cost to this province.
    #[must_use]
    pub fn shipping_cost(&self) -> Price {
        Price::from_dinars(self.shipping_dinars)
    }

    /// Look up a province by name (case-insensitive, surrounding whitespace ignored)
    /// or by its numeric code.
    #[must_use]
    pub fn find(query: &str) -> Option<&'static Self> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        if let Ok(code) = query.parse::<u8>() {
            return WILAYAS.iter().find(|w| w.code == code);
        }
        WILAYAS
            .iter()
            .find(|w| w.name.to_lowercase() == query.to_lowercase())
    }
}

/// Province preselected on the checkout form.
pub const DEFAULT_WILAYA: &str = "Alger";

/// All 48 provinces in code order.
pub static WILAYAS: [Wilaya; 48] = [
    Wilaya::new(1, "Adrar", 800),
    Wilaya::new(2, "Chlef", 600),
    Wilaya::new(3, "Laghouat", 700),
    Wilaya::new(4, "Oum El Bouaghi", 550),
    Wilaya::new(5, "Batna", 600),
    Wilaya::new(6, "Béjaïa", 500),
    Wilaya::new(7, "Biskra", 650),
    Wilaya::new(8, "Béchar", 900),
    Wilaya::new(9, "Blida", 400),
    Wilaya::new(10, "Bouïra", 450),
    Wilaya::new(11, "Tamanrasset", 1200),
    Wilaya::new(12, "Tébessa", 650),
    Wilaya::new(13, "Tlemcen", 550),
    Wilaya::new(14, "Tiaret", 550),
    Wilaya::new(15, "Tizi Ouzou", 500),
    Wilaya::new(16, "Alger", 300),
    Wilaya::new(17, "Djelfa", 600),
    Wilaya::new(18, "Jijel", 500),
    Wilaya::new(19, "Sétif", 550),
    Wilaya::new(20, "Saïda", 600),
    Wilaya::new(21, "Skikda", 500),
    Wilaya::new(22, "Sidi Bel Abbès", 600),
    Wilaya::new(23, "Annaba", 550),
    Wilaya::new(24, "Guelma", 600),
    Wilaya::new(25, "Constantine", 550),
    Wilaya::new(26, "Médéa", 450),
    Wilaya::new(27, "Mostaghanem", 500),
    Wilaya::new(28, "M'Sila", 650),
    Wilaya::new(29, "Mascara", 600),
    Wilaya::new(30, "Ouargla", 900),
    Wilaya::new(31, "Oran", 500),
    Wilaya::new(32, "El Bayadh", 700),
    Wilaya::new(33, "Illizi", 1300),
    Wilaya::new(34, "Bordj Bou Arréridj", 550),
    Wilaya::new(35, "Boumerdès", 350),
    Wilaya::new(36, "El Tarf", 650),
    Wilaya::new(37, "Tindouf", 1100),
    Wilaya::new(38, "Tissemsilt", 600),
    Wilaya::new(39, "El Oued", 800),
    Wilaya::new(40, "Khenchela", 700),
    Wilaya::new(41, "Souk Ahras", 650),
    Wilaya::new(42, "Tipaza", 400),
    Wilaya::new(43, "Mila", 600),
    Wilaya::new(44, "Aïn Defla", 500),
    Wilaya::new(45, "Naâma", 750),
    Wilaya::new(46, "Aïn Témouchent", 550),
    Wilaya::new(47, "Ghardaïa", 1000),
    Wilaya::new(48, "Relizane", 600),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_sequential() {
        for (index, wilaya) in WILAYAS.iter().enumerate() {
            assert_eq!(usize::from(wilaya.code), index + 1);
        }
    }

    #[test]
    fn test_find_by_name_case_insensitive() {
        let alger = Wilaya::find("  alger ").unwrap();
        assert_eq!(alger.code, 16);
        assert_eq!(alger.shipping_cost(), Price::from_dinars(300));

        assert_eq!(Wilaya::find("GHARDAÏA").unwrap().code, 47);
    }

    #[test]
    fn test_find_by_code() {
        assert_eq!(Wilaya::find("31").unwrap().name, "Oran");
        assert!(Wilaya::find("49").is_none());
    }

    #[test]
    fn test_find_unknown_or_blank() {
        assert!(Wilaya::find("").is_none());
        assert!(Wilaya::find("Atlantis").is_none());
    }

    #[test]
    fn test_default_wilaya_exists() {
        assert!(Wilaya::find(DEFAULT_WILAYA).is_some());
    }
}
