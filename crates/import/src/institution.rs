/// Returned when no fingerprint is found in the document.
pub const UNIDENTIFIED_INSTITUTION: &str = "unidentified";

#[derive(Debug, Clone, Copy)]
pub struct Institution {
    pub name: &'static str,
    /// Uppercase substrings that identify statements from this institution.
    pub fingerprints: &'static [&'static str],
}

/// Checked top to bottom; the first institution with any fingerprint in the
/// text wins. Extending coverage means adding a row here.
#[rustfmt::skip]
pub const INSTITUTIONS: &[Institution] = &[
    Institution { name: "Banco de Chile", fingerprints: &["BANCO DE CHILE", "BANCHILE", "REDCOMPRA CHILE"] },
    Institution { name: "Banco Santander", fingerprints: &["SANTANDER", "BANCO SANTANDER"] },
    Institution { name: "BancoEstado", fingerprints: &["BANCOESTADO", "BANCO ESTADO", "BANCO DEL ESTADO"] },
    Institution { name: "BCI", fingerprints: &["BCI", "BANCO DE CREDITO E INVERSIONES"] },
    Institution { name: "Itaú", fingerprints: &["ITAU", "ITAÚ", "BANCO ITAU"] },
    Institution { name: "Scotiabank", fingerprints: &["SCOTIABANK", "NOVA SCOTIABANK"] },
    Institution { name: "BICE", fingerprints: &["BICE", "BANCO BICE"] },
    Institution { name: "Banco Security", fingerprints: &["SECURITY", "BANCO SECURITY"] },
    Institution { name: "Banco Falabella", fingerprints: &["FALABELLA", "CMR FALABELLA"] },
    Institution { name: "Banco Ripley", fingerprints: &["RIPLEY"] },
    Institution { name: "Banco Consorcio", fingerprints: &["CONSORCIO", "BANCO CONSORCIO"] },
    Institution { name: "COOPEUCH", fingerprints: &["COOPEUCH"] },
    Institution { name: "Tenpo", fingerprints: &["TENPO"] },
    Institution { name: "Mercado Pago", fingerprints: &["MERCADO PAGO", "MERCADOPAGO"] },
    Institution { name: "MACH", fingerprints: &["MACH"] },
];

impl Institution {
    fn matches(&self, upper_text: &str) -> bool {
        self.fingerprints.iter().any(|f| upper_text.contains(f))
    }
}

/// Name the institution that issued `text`, or [`UNIDENTIFIED_INSTITUTION`].
pub fn detect_institution(text: &str) -> &'static str {
    let upper = text.to_uppercase();
    INSTITUTIONS
        .iter()
        .find(|inst| inst.matches(&upper))
        .map_or(UNIDENTIFIED_INSTITUTION, |inst| inst.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_case_insensitively() {
        assert_eq!(detect_institution("Cartola Banco de Chile\n15/01/2025;x"), "Banco de Chile");
        assert_eq!(detect_institution("cuenta rut bancoestado"), "BancoEstado");
    }

    #[test]
    fn accented_fingerprint() {
        assert_eq!(detect_institution("Banco Itaú Chile"), "Itaú");
    }

    #[test]
    fn first_entry_in_table_order_wins() {
        // Both Santander and Falabella fingerprints present.
        assert_eq!(
            detect_institution("Pago CMR Falabella desde Santander"),
            "Banco Santander"
        );
    }

    #[test]
    fn fingerprint_anywhere_in_text() {
        assert_eq!(detect_institution("15/01/2025;Transferencia a Tenpo;-5000"), "Tenpo");
    }

    #[test]
    fn unidentified_when_nothing_matches() {
        assert_eq!(detect_institution("15/01/2025;Compra Jumbo;-25000"), UNIDENTIFIED_INSTITUTION);
        assert_eq!(detect_institution(""), UNIDENTIFIED_INSTITUTION);
    }

    #[test]
    fn table_names_are_unique() {
        let mut names: Vec<_> = INSTITUTIONS.iter().map(|i| i.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), INSTITUTIONS.len());
    }
}
