// This file reads the two probability sources, merges them into one row per team
// and validates those rows into the TeamTable the rest of the program works from.
// The crowd sheet is an ESPN "who picked whom" export: one column per round (R2..R7),
// every cell "<seed><Team>-<pct>%".
// The model forecast is a FiveThirtyEight export with team_name, team_seed, team_region
// and rd2_win..rd7_win columns.
// An already merged table (Team, Seed, Region, R2_ESPN..R7_ESPN, R2_538..R7_538) can be read directly.

use csv::StringRecord;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, ModelScale};
use crate::error::{IngestError, RecordError};
use crate::leverage::{Round, RoundValues};
use crate::topology::RegionHalves;

/// Per-round values as read from a source; `None` where the source had nothing.
pub type RawValues = [Option<f64>; 6];

#[derive(Debug, Clone, Serialize)]
pub struct Team {
    pub name: String,
    pub seed: u8,
    pub region: String,
    /// Share of the crowd picking this team to win through each round, 0-100
    pub crowd_pct: RoundValues,
    /// Model probability of winning through each round, 0-100
    pub model_pct: RoundValues,
}

impl Team {
    pub fn new(
        name: String,
        seed: u8,
        region: String,
        crowd_pct: RoundValues,
        model_pct: RoundValues,
    ) -> Team {
        Team {
            name,
            seed,
            region,
            crowd_pct,
            model_pct,
        }
    }

    #[inline]
    pub fn crowd(&self, round: Round) -> f64 {
        self.crowd_pct[round.index()]
    }

    #[inline]
    pub fn model(&self, round: Round) -> f64 {
        self.model_pct[round.index()]
    }
}

/// One merged but unvalidated team row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTeamRow {
    pub name: Option<String>,
    pub seed: Option<String>,
    pub region: Option<String>,
    pub crowd: RawValues,
    pub model: RawValues,
}

/// Rows read from a source plus the records that could not be read at all.
#[derive(Debug, Clone, Default)]
pub struct SourceRows {
    pub rows: Vec<RawTeamRow>,
    pub rejected: Vec<RecordError>,
}

/// Validated teams. Every record that failed validation is listed in `rejected`.
#[derive(Debug, Clone, Default)]
pub struct TeamTable {
    teams: Vec<Team>,
    rejected: Vec<RecordError>,
}

impl TeamTable {
    /// Validate every row against the region layout. Bad rows are logged and dropped;
    /// the first row with a given name wins.
    pub fn from_rows(rows: Vec<RawTeamRow>, halves: &RegionHalves) -> TeamTable {
        Self::from_source(
            SourceRows {
                rows,
                rejected: Vec::new(),
            },
            halves,
        )
    }

    pub fn from_source(source: SourceRows, halves: &RegionHalves) -> TeamTable {
        let mut table = TeamTable::default();
        for error in source.rejected {
            table.reject(error);
        }

        let mut seen: HashSet<String> = HashSet::new();
        for (i, row) in source.rows.into_iter().enumerate() {
            match validate(i + 1, row, halves) {
                Ok(team) => {
                    if seen.insert(team.name.clone()) {
                        table.teams.push(team);
                    } else {
                        table.reject(RecordError::DuplicateTeam { team: team.name });
                    }
                }
                Err(error) => table.reject(error),
            }
        }

        info!(
            "Team table ready: {} teams, {} rejected",
            table.teams.len(),
            table.rejected.len()
        );
        table
    }

    fn reject(&mut self, error: RecordError) {
        warn!("Dropping team record: {}", error);
        self.rejected.push(error);
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn rejected(&self) -> &[RecordError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate(row: usize, raw: RawTeamRow, halves: &RegionHalves) -> Result<Team, RecordError> {
    let name = non_empty(raw.name.as_deref())
        .ok_or(RecordError::MissingName { row })?
        .to_string();

    let raw_seed = non_empty(raw.seed.as_deref()).ok_or_else(|| RecordError::MissingField {
        team: name.clone(),
        field: "seed",
    })?;
    let seed = parse_seed(raw_seed)
        .filter(|s| (1..=16).contains(s))
        .ok_or_else(|| RecordError::SeedOutOfRange {
            team: name.clone(),
            seed: raw_seed.to_string(),
        })?;

    let region = non_empty(raw.region.as_deref()).ok_or_else(|| RecordError::MissingField {
        team: name.clone(),
        field: "region",
    })?;
    if !halves.contains(region) {
        return Err(RecordError::UnknownRegion {
            team: name,
            region: region.to_string(),
        });
    }
    let region = region.to_string();

    let crowd_pct = percentages(&name, &raw.crowd, "ESPN")?;
    let model_pct = percentages(&name, &raw.model, "538")?;
    Ok(Team::new(name, seed, region, crowd_pct, model_pct))
}

/// Missing values become 0; anything outside 0..=100 rejects the row.
fn percentages(team: &str, values: &RawValues, source: &str) -> Result<RoundValues, RecordError> {
    let mut out = [0.0; 6];
    for round in Round::ALL {
        let value = values[round.index()].unwrap_or(0.0);
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(RecordError::ProbabilityOutOfRange {
                team: team.to_string(),
                column: format!("{}_{}", round.column(), source),
                value,
            });
        }
        out[round.index()] = value;
    }
    Ok(out)
}

/// Leading digits with at most one play-in letter after them, so "16a" reads as 16.
/// Signs, decimals and anything else give None.
pub fn parse_seed(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, suffix) = raw.split_at(split);
    let mut suffix = suffix.chars();
    match (suffix.next(), suffix.next()) {
        (None, _) => {}
        (Some(c), None) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    digits.parse().ok()
}

/// "97.5%", "97.5" and " 97.5 % " all read as 97.5.
pub fn parse_percent(text: &str) -> Option<f64> {
    text.trim().trim_end_matches('%').trim().parse().ok()
}

/// "1Alabama-97.5%" -> ("Alabama", 97.5).
/// Cells holding an unresolved play-in ("A/B"), no dash or no number give None.
pub fn parse_pick_cell(cell: &str) -> Option<(String, f64)> {
    let cell = cell.trim();
    if cell.contains('/') {
        return None;
    }
    let (team, pct) = cell.rsplit_once('-')?;
    let pct = parse_percent(pct)?;
    let team = team
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim();
    if team.is_empty() {
        return None;
    }
    Some((team.to_string(), pct))
}

fn column_index(headers: &StringRecord, input: &'static str, column: &str) -> Result<usize, IngestError> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| IngestError::MissingColumn {
            input,
            column: column.to_string(),
        })
}

/// Turn a per-record csv error into a rejected record; anything else is fatal.
fn unreadable(error: csv::Error) -> Result<RecordError, IngestError> {
    match error.kind() {
        csv::ErrorKind::Deserialize { pos, err } => Ok(RecordError::Unreadable {
            line: pos.as_ref().map_or(0, |p| p.line()),
            message: err.to_string(),
        }),
        csv::ErrorKind::Utf8 { pos, err } => Ok(RecordError::Unreadable {
            line: pos.as_ref().map_or(0, |p| p.line()),
            message: err.to_string(),
        }),
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Ok(RecordError::Unreadable {
            line: pos.as_ref().map_or(0, |p| p.line()),
            message: format!("expected {} fields, found {}", expected_len, len),
        }),
        _ => Err(error.into()),
    }
}

/// Crowd pick percentages by team name, as written in the sheet.
#[derive(Debug, Clone, Default)]
pub struct CrowdPicks {
    pub picks: BTreeMap<String, RawValues>,
    /// Sheet records that could not be read
    pub rejected: Vec<RecordError>,
}

/// `header_rows` data rows below the csv header are skipped.
pub fn read_crowd_sheet<R: io::Read>(reader: R, header_rows: usize) -> Result<CrowdPicks, IngestError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let mut columns = [0usize; 6];
    for round in Round::ALL {
        columns[round.index()] = column_index(&headers, "crowd pick sheet", round.column())?;
    }

    let mut sheet = CrowdPicks::default();
    for result in rdr.records().skip(header_rows) {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                sheet.rejected.push(unreadable(e)?);
                continue;
            }
        };
        for round in Round::ALL {
            let cell = match record.get(columns[round.index()]) {
                Some(cell) => cell,
                None => continue,
            };
            if let Some((team, pct)) = parse_pick_cell(cell) {
                let entry = sheet.picks.entry(team).or_insert([None; 6]);
                if entry[round.index()].replace(pct).is_some() {
                    debug!("Crowd sheet lists a team twice in {}", round.column());
                }
            }
        }
    }
    Ok(sheet)
}

const FORECAST_COLUMNS: [&str; 9] = [
    "team_name",
    "team_seed",
    "team_region",
    "rd2_win",
    "rd3_win",
    "rd4_win",
    "rd5_win",
    "rd6_win",
    "rd7_win",
];

fn percent_cell<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match non_empty(raw.as_deref()) {
        None => Ok(None),
        Some(text) => parse_percent(text)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("'{}' is not a number", text))),
    }
}

#[derive(Debug, Deserialize)]
struct ForecastRow {
    team_name: Option<String>,
    team_seed: Option<String>,
    team_region: Option<String>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd2_win: Option<f64>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd3_win: Option<f64>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd4_win: Option<f64>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd5_win: Option<f64>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd6_win: Option<f64>,
    #[serde(default, deserialize_with = "percent_cell")]
    rd7_win: Option<f64>,
}

impl ForecastRow {
    fn into_raw(self, scale: ModelScale) -> RawTeamRow {
        let model = [
            self.rd2_win,
            self.rd3_win,
            self.rd4_win,
            self.rd5_win,
            self.rd6_win,
            self.rd7_win,
        ]
        .map(|value| value.map(|v| scale.to_percent(v)));
        RawTeamRow {
            name: self.team_name,
            seed: self.team_seed,
            region: self.team_region,
            crowd: [None; 6],
            model,
        }
    }
}

/// Model forecast rows. Seed and region come from here.
pub fn read_model_forecast<R: io::Read>(reader: R, scale: ModelScale) -> Result<SourceRows, IngestError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    for column in FORECAST_COLUMNS {
        column_index(&headers, "model forecast", column)?;
    }

    let mut source = SourceRows::default();
    for result in rdr.deserialize::<ForecastRow>() {
        match result {
            Ok(row) => source.rows.push(row.into_raw(scale)),
            Err(e) => source.rejected.push(unreadable(e)?),
        }
    }
    Ok(source)
}

/// Outer join of the two sources on canonical team name.
/// Teams only the crowd knows about have no seed or region and will fail validation.
pub fn merge_sources(crowd: CrowdPicks, model: SourceRows, config: &Config) -> SourceRows {
    let mut rejected = crowd.rejected;
    rejected.extend(model.rejected);
    let mut crowd: BTreeMap<String, RawValues> = crowd
        .picks
        .into_iter()
        .map(|(name, picks)| (config.canonical_name(&name), picks))
        .collect();

    let mut merged = SourceRows {
        rows: Vec::with_capacity(model.rows.len() + crowd.len()),
        rejected,
    };
    for mut row in model.rows {
        if let Some(name) = row.name.as_deref() {
            let name = config.canonical_name(name);
            match crowd.remove(&name) {
                Some(picks) => row.crowd = picks,
                None => debug!("{} has no crowd picks", name),
            }
            row.name = Some(name);
        }
        merged.rows.push(row);
    }

    for (name, picks) in crowd {
        debug!("{} only appears in the crowd sheet", name);
        merged.rows.push(RawTeamRow {
            name: Some(name),
            crowd: picks,
            ..RawTeamRow::default()
        });
    }
    merged
}

fn cell_text(record: &StringRecord, idx: usize) -> Option<String> {
    non_empty(record.get(idx)).map(str::to_string)
}

fn cell_percent(record: &StringRecord, idx: usize, column: &str) -> Result<Option<f64>, String> {
    match non_empty(record.get(idx)) {
        None => Ok(None),
        Some(text) => parse_percent(text)
            .map(Some)
            .ok_or_else(|| format!("{}: '{}' is not a number", column, text)),
    }
}

/// Read a table that already holds both sources side by side.
pub fn read_team_table<R: io::Read>(reader: R) -> Result<SourceRows, IngestError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let input = "team table";
    let name_col = column_index(&headers, input, "Team")?;
    let seed_col = column_index(&headers, input, "Seed")?;
    let region_col = column_index(&headers, input, "Region")?;
    // (column index, column name) per round, in Round::ALL order
    let mut crowd_cols: Vec<(usize, String)> = Vec::with_capacity(6);
    let mut model_cols: Vec<(usize, String)> = Vec::with_capacity(6);
    for round in Round::ALL {
        let crowd = format!("{}_ESPN", round.column());
        let model = format!("{}_538", round.column());
        crowd_cols.push((column_index(&headers, input, &crowd)?, crowd));
        model_cols.push((column_index(&headers, input, &model)?, model));
    }

    let mut source = SourceRows::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                source.rejected.push(unreadable(e)?);
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());

        let mut raw = RawTeamRow {
            name: cell_text(&record, name_col),
            seed: cell_text(&record, seed_col),
            region: cell_text(&record, region_col),
            ..RawTeamRow::default()
        };
        let parsed: Result<(), String> = Round::ALL.iter().try_for_each(|round| {
            let (idx, column) = &crowd_cols[round.index()];
            raw.crowd[round.index()] = cell_percent(&record, *idx, column)?;
            let (idx, column) = &model_cols[round.index()];
            raw.model[round.index()] = cell_percent(&record, *idx, column)?;
            Ok(())
        });
        match parsed {
            Ok(()) => source.rows.push(raw),
            Err(message) => source.rejected.push(RecordError::Unreadable { line, message }),
        }
    }
    Ok(source)
}

/// Read, merge and validate the crowd sheet and the model forecast.
pub fn load_sources(
    crowd_path: &Path,
    model_path: &Path,
    config: &Config,
    halves: &RegionHalves,
) -> Result<TeamTable, IngestError> {
    let crowd = read_crowd_sheet(File::open(crowd_path)?, config.sources.crowd_header_rows)?;
    info!(
        "Read crowd picks for {} teams from {}",
        crowd.picks.len(),
        crowd_path.display()
    );
    let model = read_model_forecast(File::open(model_path)?, config.sources.model_scale)?;
    info!("Read {} forecast rows from {}", model.rows.len(), model_path.display());
    let merged = merge_sources(crowd, model, config);
    Ok(TeamTable::from_source(merged, halves))
}

/// Read and validate a merged team table.
pub fn load_table(path: &Path, halves: &RegionHalves) -> Result<TeamTable, IngestError> {
    let source = read_team_table(File::open(path)?)?;
    Ok(TeamTable::from_source(source, halves))
}
