//! Note header fields: broker, note number, trading date and client
//!
//! Every field is tried against an ordered pattern list; the first hit
//! wins. B3 file names (`008401877_20250402_20250403_BMF.pdf`) carry the
//! note number and trading date and are consulted first.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::model::BrokerageNote;
use crate::document::NoteDocument;

static BROKERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("xp", r"XP\s+INVESTIMENTOS|CORRETORA\s+XP"),
        ("clear", r"CLEAR\s+CORRETORA|CLEAR\s+CTVM"),
        ("rico", r"RICO\s+INVESTIMENTOS|RICO\s+CTVM"),
        ("modal", r"MODAL\s+DTVM|MODAL\s+MAIS"),
        ("inter", r"INTER\s+DTVM|BANCO\s+INTER"),
        ("guide", r"GUIDE\s+INVESTIMENTOS"),
        ("nuinvest", r"NU\s+INVEST|NUINVEST|EASYNVEST"),
        ("itau", r"ITA[UÚ]\s+CORRETORA"),
        ("bradesco", r"BRADESCO\s+S/?A|BRADESCO\s+CORRETORA"),
        ("santander", r"SANTANDER\s+CORRETORA|SANTANDER\s+CTVM"),
        ("btg", r"BTG\s+PACTUAL"),
        ("genial", r"GENIAL\s+INVESTIMENTOS"),
        ("terra", r"TERRA\s+INVESTIMENTOS"),
        ("orama", r"[OÓ]RAMA\s+DTVM"),
        ("necton", r"NECTON\s+INVESTIMENTOS"),
        ("nova_futura", r"NOVA\s+FUTURA\s+CTVM"),
        ("toro", r"TORO\s+INVESTIMENTOS"),
        ("c6", r"C6\s+CTVM|C6\s+BANK"),
        ("mirae", r"MIRAE\s+ASSET"),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        (
            name,
            Regex::new(&format!("(?i){}", pattern)).expect("valid broker regex"),
        )
    })
    .collect()
});

static NOTE_NUMBER: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Nr\.\s*(?:nota|order|negoci)\s*:\s*(\d+)",
        r"N[o°º]\s*(?:da nota|nota)\s*:\s*(\d+)",
        r"N[uú]mero\s*(?:da nota|nota|folha)\s*:\s*(\d+)",
        r"(?:Nota|Folha)\s*(?:n[o°º]|n[uú]mero|\#)\s*:\s*(\d+)",
        r"(?:NOTA|BOLETA)\s*(?:DE CORRETAGEM|DE NEGOCIA[ÇC][ÃA]O)\s*[^\d]*(\d+)",
        r"Nr\.?\s*Boleta:?\s*(\d+)",
        r"Boleta\s+N[º°o]\s*(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}", p)).expect("valid note number regex"))
    .collect()
});

const DATE: &str = r"(\d{2}[/-]\d{2}[/-]\d{4}|\d{2}[/-]\d{2}[/-]\d{2})\b";

static TRADE_DATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Data(?:\s+preg[ãa]o)?\s*:\s*",
        r"(?:Date|Dia)\s*:\s*",
        r"Preg[ãa]o(?:\s+de)?\s*:?\s*",
        r"(?:Data|Date)\s*(?:de|da|do)?\s*(?:neg[oó]ci(?:o|a[çc][ãa]o)|opera[çc][õo]es)\s*:?\s*",
        r"D\.?\s*Preg[ãa]o:?\s*",
        r"(?:Data|Date)\s*Liquida[çc][ãa]o:?\s*",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){}{}", p, DATE)).expect("valid date regex"))
    .collect()
});

static FILE_NUMBER_AND_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)[_\s](\d{8})").expect("valid file name regex"));
static FILE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_(\d{8})(?:_|\.|$)").expect("valid file name regex"));
static FILE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)(?:_|\s)").expect("valid file name regex"));
static CLIENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:cliente|name|nome)\s*:\s*(.+?)(?:\s{2,}|$)").expect("valid client regex")
});

/// First broker whose pattern appears in the text
pub fn detect_broker(text: &str) -> Option<&'static str> {
    BROKERS
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(name, _)| *name)
}

pub fn find_note_number(text: &str) -> Option<String> {
    NOTE_NUMBER
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

/// Trading date printed on the note. A pattern whose date does not exist
/// on the calendar (`31/02/2025`) falls through to the next one.
pub fn find_trade_date(text: &str) -> Option<NaiveDate> {
    TRADE_DATE
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| parse_note_date(&caps[1]))
}

/// `dd/mm/yyyy`, `dd-mm-yyyy` or `dd/mm/yy` (two-digit years are 20yy)
pub fn parse_note_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['/', '-']).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `YYYYMMDD` as found in B3 file names
fn parse_compact_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").ok()
}

/// Note number and trading date from a `<number>_<YYYYMMDD>...` file name
pub fn from_file_name(file_name: &str) -> (Option<String>, Option<NaiveDate>) {
    if let Some(caps) = FILE_NUMBER_AND_DATE.captures(file_name) {
        return (Some(caps[1].to_string()), parse_compact_date(&caps[2]));
    }
    let number = FILE_NUMBER
        .captures(file_name)
        .map(|caps| caps[1].to_string());
    let date = FILE_DATE
        .captures(file_name)
        .and_then(|caps| parse_compact_date(&caps[1]));
    (number, date)
}

/// Client name from the first ten lines
pub fn find_client(text: &str) -> Option<String> {
    text.lines()
        .take(10)
        .find_map(|line| CLIENT.captures(line.trim()))
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Fill the header fields of `note` from the document
pub fn fill(note: &mut BrokerageNote, doc: &NoteDocument) {
    if let Some(broker) = detect_broker(&doc.text) {
        note.broker = broker.to_string();
    }

    let (file_number, file_date) = from_file_name(&doc.file_name);
    note.number = find_note_number(&doc.text).or(file_number);
    note.date = find_trade_date(&doc.text).or(file_date);
    note.client = find_client(&doc.text);

    debug!(
        "{}: broker={} number={:?} date={:?}",
        doc.file_name, note.broker, note.number, note.date
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_broker() {
        assert_eq!(detect_broker("BTG Pactual CTVM S.A."), Some("btg"));
        assert_eq!(detect_broker("XP INVESTIMENTOS CCTVM S/A"), Some("xp"));
        assert_eq!(detect_broker("Easynvest - Título CV"), Some("nuinvest"));
        assert_eq!(detect_broker("Banco Qualquer"), None);
    }

    #[test]
    fn test_find_note_number() {
        assert_eq!(find_note_number("Nr. nota: 8401877"), Some("8401877".into()));
        assert_eq!(find_note_number("Número da nota: 42"), Some("42".into()));
        assert_eq!(find_note_number("Nr. Boleta 77"), Some("77".into()));
        assert_eq!(find_note_number("sem número"), None);
    }

    #[test]
    fn test_find_trade_date_formats() {
        assert_eq!(
            find_trade_date("Data pregão: 16/04/2025"),
            NaiveDate::from_ymd_opt(2025, 4, 16)
        );
        assert_eq!(
            find_trade_date("Pregão de 02-01-25"),
            NaiveDate::from_ymd_opt(2025, 1, 2)
        );
        assert_eq!(
            find_trade_date("D. Pregão 03/02/2025"),
            NaiveDate::from_ymd_opt(2025, 2, 3)
        );
    }

    #[test]
    fn test_invalid_calendar_date_falls_through() {
        let text = "Data: 31/02/2025\nData Liquidação: 05/03/2025";
        assert_eq!(find_trade_date(text), NaiveDate::from_ymd_opt(2025, 3, 5));
    }

    #[test]
    fn test_from_file_name() {
        let (number, date) = from_file_name("008401877_20250402_20250403_BMF.pdf");
        assert_eq!(number.as_deref(), Some("008401877"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 4, 2));

        let (number, date) = from_file_name("nota_20250110.pdf");
        assert_eq!(number, None);
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 10));

        assert_eq!(from_file_name("nota.pdf"), (None, None));
    }

    #[test]
    fn test_find_client() {
        let text = "BTG PACTUAL\nCliente: FULANO DE TAL     CPF 000\n";
        assert_eq!(find_client(text), Some("FULANO DE TAL".into()));
        assert_eq!(find_client("nada aqui"), None);
    }

    #[test]
    fn test_fill_prefers_printed_values() {
        let doc = NoteDocument::from_text(
            "0001_20250402.pdf",
            "BTG PACTUAL\nNr. nota: 8401877\nData pregão: 01/04/2025",
        );
        let mut note = BrokerageNote::new(&doc.file_name, "direct");
        fill(&mut note, &doc);
        assert_eq!(note.broker, "btg");
        assert_eq!(note.number.as_deref(), Some("8401877"));
        assert_eq!(note.date, NaiveDate::from_ymd_opt(2025, 4, 1));
    }

    #[test]
    fn test_fill_falls_back_to_file_name() {
        let doc = NoteDocument::from_text("0001_20250402.pdf", "BTG PACTUAL\nC WINJ25 3 131.820,00");
        let mut note = BrokerageNote::new(&doc.file_name, "direct");
        fill(&mut note, &doc);
        assert_eq!(note.number.as_deref(), Some("0001"));
        assert_eq!(note.date, NaiveDate::from_ymd_opt(2025, 4, 2));
    }
}
