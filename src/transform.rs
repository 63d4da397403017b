//! Cleaning and augmentation of the loaded table into typed per-region records.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::{
    config::RunConfig,
    foundation::{
        core::Rgb8,
        error::{RaceError, RaceResult},
    },
    loader::Table,
    regions::RegionTable,
};

/// One region on one date, after filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Position among the retained rows, in input order. Breaks ranking ties.
    pub row: usize,
    pub region: String,
    pub date: NaiveDate,
    pub cases: u64,
    pub population: f64,
    pub incidence_per_thousand: f64,
    pub color: Rgb8,
    /// Values of [`Dataset::extra_columns`] for this row.
    pub extras: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<Record>,
    /// Distinct dates present, ascending.
    pub dates: Vec<NaiveDate>,
    /// Columns that survived pruning and are not one of the typed fields.
    pub extra_columns: Vec<String>,
}

impl Dataset {
    /// Largest incidence in the whole table, or 0 when empty.
    pub fn max_incidence(&self) -> f64 {
        self.records
            .iter()
            .map(|r| r.incidence_per_thousand)
            .fold(0.0, f64::max)
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }
}

pub fn incidence_per_thousand(cases: u64, population: f64) -> f64 {
    1000.0 * cases as f64 / population
}

/// Tokens a pandas-style reader treats as a missing value.
const MISSING_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing(s: &str) -> bool {
    MISSING_TOKENS.contains(&s.trim())
}

/// Day-first date parsing. ISO `yyyy-mm-dd` is unambiguous and accepted too.
pub fn parse_day_first(s: &str) -> RaceResult<NaiveDate> {
    const FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];
    let s = s.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| RaceError::data(format!("unparseable date \"{s}\"")))
}

fn parse_population(s: &str) -> RaceResult<f64> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| RaceError::data(format!("population \"{s}\" is not numeric")))?;
    if !v.is_finite() || v <= 0.0 {
        return Err(RaceError::data(format!(
            "population must be a positive number (got {s})"
        )));
    }
    Ok(v)
}

fn parse_cases(s: &str) -> RaceResult<u64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<u64>() {
        return Ok(v);
    }
    // Spreadsheet exports sometimes write integral counts as "12.0".
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 => {
            Ok(v as u64)
        }
        _ => Err(RaceError::data(format!(
            "cumulative case count \"{s}\" is not a non-negative integer"
        ))),
    }
}

/// Filter, coerce, derive, prune, color and date-parse the loaded table.
///
/// Any bad retained value fails the whole table; there is no per-row skipping.
pub fn transform(mut table: Table, cfg: &RunConfig, regions: &RegionTable) -> RaceResult<Dataset> {
    let cols = &cfg.columns;
    let scope_col = table.column_index(&cols.scope)?;
    let sub_region_col = table.column_index(&cols.sub_region)?;
    let population_col = table.column_index(&cols.population)?;

    let loaded = table.len();
    table.retain_rows(|r| {
        r[scope_col].trim() != cfg.national_scope
            && is_missing(&r[sub_region_col])
            && !is_missing(&r[population_col])
    });
    tracing::debug!(loaded, retained = table.len(), "filtered region rows");

    table.drop_columns(&cfg.pruned_columns);

    let region_col = table.column_index(&cols.region_code)?;
    let date_col = table.column_index(&cols.date)?;
    let cases_col = table.column_index(&cols.cases)?;
    let population_col = table.column_index(&cols.population)?;
    let typed = [region_col, date_col, cases_col, population_col];

    let extra_idx: Vec<usize> = (0..table.headers().len())
        .filter(|i| !typed.contains(i))
        .collect();
    let extra_columns = extra_idx
        .iter()
        .map(|&i| table.headers()[i].clone())
        .collect();

    regions.validate_codes(table.rows().iter().map(|r| r[region_col].trim()))?;

    let mut records = Vec::with_capacity(table.len());
    for (row, r) in table.rows().iter().enumerate() {
        let at_row = |e: RaceError| match e {
            RaceError::Data(msg) => RaceError::data(format!("retained row {}: {msg}", row + 1)),
            other => other,
        };
        let population = parse_population(&r[population_col]).map_err(at_row)?;
        let cases = parse_cases(&r[cases_col]).map_err(at_row)?;
        let date = parse_day_first(&r[date_col]).map_err(at_row)?;
        let code = r[region_col].trim().to_owned();

        records.push(Record {
            row,
            color: regions.color(&code)?,
            region: code,
            date,
            cases,
            population,
            incidence_per_thousand: incidence_per_thousand(cases, population),
            extras: extra_idx.iter().map(|&i| r[i].to_owned()).collect(),
        });
    }

    let mut seen = HashSet::with_capacity(records.len());
    for r in &records {
        if !seen.insert((r.region.as_str(), r.date)) {
            return Err(RaceError::data(format!(
                "duplicate record for region '{}' on {}",
                r.region, r.date
            )));
        }
    }

    let mut dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    tracing::debug!(
        records = records.len(),
        dates = dates.len(),
        "transformed dataset"
    );

    Ok(Dataset {
        records,
        dates,
        extra_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::read_csv;

    fn run(csv: &str) -> RaceResult<Dataset> {
        let cfg = RunConfig::default();
        let table = read_csv(csv.as_bytes(), b',')?;
        transform(table, &cfg, &RegionTable::brazil("estados", "png"))
    }

    const HEADER: &str =
        "regiao,estado,municipio,coduf,data,semanaEpi,casosAcumulado,casosNovos,obitosAcumulado,populacaoTCU2019\n";

    #[test]
    fn filters_national_municipal_and_missing_population_rows() {
        let csv = format!(
            "{HEADER}\
Brasil,,,76,25/02/2020,9,1,1,0,210147125
Sudeste,SP,,35,25/02/2020,9,1,1,0,45919049
Sudeste,SP,Campinas,35,25/02/2020,9,0,0,0,1204073
Sudeste,RJ,,33,25/02/2020,9,0,0,0,
Sul,RS,,43,26/02/2020,9,5,5,0,11377239
"
        );
        let ds = run(&csv).unwrap();
        let codes: Vec<_> = ds.records.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(codes, ["SP", "RS"]);
        assert_eq!(ds.dates.len(), 2);
        assert!(ds.records.iter().all(|r| r.population > 0.0));
    }

    #[test]
    fn missing_value_tokens_count_as_absent() {
        let csv = format!(
            "{HEADER}\
Sudeste,SP,,35,01/04/2020,14,10,1,0,1000
Sudeste,RJ,,33,01/04/2020,14,5,1,0,NA
Sudeste,MG,,31,01/04/2020,14,5,1,0,NaN
Sudeste,ES,NA,32,01/04/2020,14,7,1,0,1000
Sudeste,ES,Vitoria,32,01/04/2020,14,99,1,0,300
Sul,PR,nan,41,01/04/2020,14,2,1,0,null
"
        );
        let ds = run(&csv).unwrap();
        let codes: Vec<_> = ds.records.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(codes, ["SP", "ES"]);
        assert_eq!(ds.records[1].cases, 7);

        assert!(is_missing(" N/A "));
        assert!(!is_missing("0"));
    }

    #[test]
    fn derives_incidence_per_thousand() {
        let csv = format!(
            "{HEADER}\
Norte,AC,,12,01/04/2020,14,10,1,0,1000
Norte,AM,,13,01/04/2020,14,5,1,0,1000
"
        );
        let ds = run(&csv).unwrap();
        assert_eq!(ds.records[0].incidence_per_thousand, 10.0);
        assert_eq!(ds.records[1].incidence_per_thousand, 5.0);
        for r in &ds.records {
            let expect = 1000.0 * r.cases as f64 / r.population;
            assert!((r.incidence_per_thousand - expect).abs() < 1e-12);
        }
    }

    #[test]
    fn prunes_fixed_columns_and_keeps_the_rest_as_extras() {
        let csv = format!("{HEADER}Norte,AC,,12,01/04/2020,14,10,1,3,1000\n");
        let ds = run(&csv).unwrap();
        assert_eq!(ds.extra_columns, ["regiao", "obitosAcumulado"]);
        assert_eq!(ds.records[0].extras, ["Norte", "3"]);
    }

    #[test]
    fn assigns_colors_from_table() {
        let csv = format!("{HEADER}Sudeste,SP,,35,01/04/2020,14,10,1,0,1000\n");
        let ds = run(&csv).unwrap();
        assert_eq!(ds.records[0].color.to_hex(), "#DC143C");
    }

    #[test]
    fn unknown_region_code_fails_fast() {
        let csv = format!("{HEADER}Sudeste,XX,,35,01/04/2020,14,10,1,0,1000\n");
        let err = run(&csv).unwrap_err();
        assert!(matches!(err, RaceError::Config(_)), "{err}");
    }

    #[test]
    fn non_numeric_population_is_fatal() {
        let csv = format!("{HEADER}Sudeste,SP,,35,01/04/2020,14,10,1,0,muitos\n");
        let err = run(&csv).unwrap_err();
        assert!(matches!(err, RaceError::Data(_)), "{err}");
    }

    #[test]
    fn unparseable_date_is_fatal() {
        let csv = format!("{HEADER}Sudeste,SP,,35,2020/31/31,14,10,1,0,1000\n");
        assert!(run(&csv).is_err());
    }

    #[test]
    fn duplicate_region_date_is_fatal() {
        let csv = format!(
            "{HEADER}\
Sudeste,SP,,35,01/04/2020,14,10,1,0,1000
Sudeste,SP,,35,01/04/2020,14,11,1,0,1000
"
        );
        assert!(run(&csv).is_err());
    }

    #[test]
    fn day_first_parsing() {
        let d = parse_day_first("03/04/2020").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2020, 4, 3).unwrap());
        assert_eq!(parse_day_first("2020-04-03").unwrap(), d);
        assert_eq!(parse_day_first("03-04-2020").unwrap(), d);
        assert!(parse_day_first("13/13/2020").is_err());
    }

    #[test]
    fn dates_are_sorted_and_distinct() {
        let csv = format!(
            "{HEADER}\
Sul,RS,,43,02/04/2020,14,5,1,0,1000
Sul,PR,,41,01/04/2020,14,5,1,0,1000
Sul,SC,,42,02/04/2020,14,5,1,0,1000
"
        );
        let ds = run(&csv).unwrap();
        assert_eq!(
            ds.dates,
            [
                NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 4, 2).unwrap()
            ]
        );
    }

    #[test]
    fn integral_float_case_counts_are_accepted() {
        assert_eq!(parse_cases("12.0").unwrap(), 12);
        assert!(parse_cases("1.5").is_err());
        assert!(parse_cases("-3").is_err());
    }
}
