//! Scenario text format.
//!
//! A document is a sequence of sections separated by a line containing
//! exactly `-----`:
//!
//! ```text
//! Track
//! Longitude, Offset, Lanes
//! 0.00     , 0     , 2
//! -----
//! Trajectory: Ego
//! t   , x   , y   , z   , vx  , vy  , vz  , rx  , ry  , rz  , rw
//! 0.00, 0.00, 3.50, 0.00, 15.0, 0.00, 0.00, 0.00, 0.00, 0.00, 1.00
//! -----
//! ```
//!
//! Decoding is fault tolerant: blank lines are skipped, unexpected headers
//! and unparsable fields are reported as [`Diagnostic`]s and replaced by
//! best-effort values, and nothing short of an empty document stops it.

use csv::{Position, StringRecord};
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::easing::unit_quaternion_or_identity;
use crate::error::{Decoded, Diagnostic};
use crate::grid::{first_field, parse_float, parse_uint, read_records, CsvGrid, DEFAULT_DECIMALS};
use crate::scenario::Scenario;
use crate::track::Track;
use crate::trajectory::{Keyframe, Trajectory, VehicleRole};

pub const SEPARATOR_LINE: &str = "-----";
pub const TRACK_TITLE: &str = "Track";
pub const TRAJECTORY_PREFIX: &str = "Trajectory:";

pub const TRACK_COLUMNS: [&str; 3] = ["Longitude", "Offset", "Lanes"];
pub const TRAJECTORY_COLUMNS: [&str; 11] = ["t", "x", "y", "z", "vx", "vy", "vz", "rx", "ry", "rz", "rw"];
pub const LEGACY_TRAJECTORY_COLUMNS: [&str; 12] = [
    "t", "x", "y", "z", "vx", "vy", "vz", "ax", "ay", "az", "heading", "yaw",
];

/// Output formatting of the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Decimals written for every floating point field
    pub decimals: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS,
        }
    }
}

// ============================================================================
// ENCODING
// ============================================================================

/// Segment table of a track, header row included.
pub fn encode_track(track: &Track, config: &CodecConfig) -> String {
    let mut grid = CsvGrid::new(config.decimals);
    grid.push_header(&TRACK_COLUMNS);

    for segment in track.segments() {
        grid.push_float(segment.longitude);
        grid.push_uint(segment.offset);
        grid.push_uint(segment.lanes);
        grid.next_row();
    }

    grid.to_string()
}

/// Keyframe table of a trajectory in the 11 column layout.
pub fn encode_trajectory(trajectory: &Trajectory, config: &CodecConfig) -> String {
    let mut grid = CsvGrid::new(config.decimals);
    grid.push_header(&TRAJECTORY_COLUMNS);

    for keyframe in trajectory.keyframes() {
        let q = keyframe.orientation.quaternion();
        let values = [
            keyframe.time,
            keyframe.position.x,
            keyframe.position.y,
            keyframe.position.z,
            keyframe.velocity.x,
            keyframe.velocity.y,
            keyframe.velocity.z,
            q.i,
            q.j,
            q.k,
            q.w,
        ];
        for value in values {
            grid.push_float(value);
        }
        grid.next_row();
    }

    grid.to_string()
}

/// Writes the whole scenario. The ego trajectory always comes first.
pub fn encode(scenario: &Scenario, config: &CodecConfig) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(TRACK_TITLE);
    out.push('\n');
    out.push_str(&encode_track(&scenario.track, config));
    out.push_str(SEPARATOR_LINE);
    out.push('\n');

    for trajectory in scenario.ordered_trajectories() {
        out.push('\n');
        out.push_str(&format!("{} {}\n", TRAJECTORY_PREFIX, section_name(&trajectory.name)));
        out.push_str(&encode_trajectory(trajectory, config));
        out.push_str(SEPARATOR_LINE);
        out.push('\n');
    }

    out
}

/// Trajectory name as it can appear on a single title line: control
/// characters become spaces and surrounding whitespace is dropped.
fn section_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned != name {
        debug!("trajectory name {:?} written as {:?}", name, cleaned);
    }
    cleaned.to_string()
}

// ============================================================================
// DECODING
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// 1-based line number in the document
    number: usize,
    text: &'a str,
}

/// Splits the document into sections of non-blank, trimmed lines.
///
/// A `Trajectory:` title in the middle of a section is treated as the start
/// of a new one and reported as a missing separator.
fn split_sections<'a>(text: &'a str, diagnostics: &mut Vec<Diagnostic>) -> Vec<Vec<Line<'a>>> {
    let mut sections = Vec::new();
    let mut current: Vec<Line<'a>> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = Line {
            number: index + 1,
            text: raw.trim(),
        };

        if line.text.is_empty() {
            continue;
        }

        if line.text == SEPARATOR_LINE {
            if !current.is_empty() {
                sections.push(std::mem::take(&mut current));
            }
            continue;
        }

        if line.text.starts_with(TRAJECTORY_PREFIX) && !current.is_empty() {
            diagnostics.push(Diagnostic::malformed(
                line.number,
                "missing separator before trajectory section",
            ));
            sections.push(std::mem::take(&mut current));
        }

        current.push(line);
    }

    if !current.is_empty() {
        sections.push(current);
    }

    sections
}

/// One data record and the document line it came from.
struct Row {
    line: usize,
    record: StringRecord,
}

/// True if `line` is a column header row starting with `first_title`.
fn is_column_header(line: &str, first_title: &str) -> bool {
    first_field(line).is_some_and(|field| field.eq_ignore_ascii_case(first_title))
}

/// Maps a record position inside a section body back to the document line.
fn document_line(body: &[Line<'_>], position: Option<&Position>, fallback: usize) -> usize {
    position
        .and_then(|p| usize::try_from(p.line()).ok())
        .and_then(|line| body.get(line.checked_sub(1)?))
        .map_or(fallback, |row| row.number)
}

/// Reads the records of a section body. A single leading header row is
/// skipped when its first field is `first_title`; any other row is data.
fn read_rows(
    body: &[Line<'_>],
    first_title: &str,
    section_line: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Row> {
    if body.is_empty() {
        debug!("section starting at line {} has no rows", section_line);
        return Vec::new();
    }

    let text = body.iter().map(|line| line.text).collect::<Vec<_>>().join("\n");
    let mut rows = Vec::with_capacity(body.len());

    for (index, result) in read_records(&text).enumerate() {
        let fallback = body.get(index).map_or(section_line, |line| line.number);
        match result {
            Ok(record) => rows.push(Row {
                line: document_line(body, record.position(), fallback),
                record,
            }),
            Err(err) => diagnostics.push(Diagnostic::malformed(
                document_line(body, err.position(), fallback),
                format!("unreadable record: {}", err),
            )),
        }
    }

    let has_header = rows
        .first()
        .and_then(|row| row.record.get(0))
        .is_some_and(|field| field.eq_ignore_ascii_case(first_title));

    if has_header {
        rows.remove(0);
    } else if let Some(first) = rows.first() {
        diagnostics.push(Diagnostic::malformed(first.line, "missing column header row"));
    }

    rows
}

/// Reads the fields of one data row, degrading unparsable values to zero.
struct RowReader<'r, 'd> {
    row: &'r Row,
    diagnostics: &'d mut Vec<Diagnostic>,
}

impl<'r, 'd> RowReader<'r, 'd> {
    fn new(row: &'r Row, diagnostics: &'d mut Vec<Diagnostic>) -> Self {
        Self { row, diagnostics }
    }

    fn columns(&self) -> usize {
        self.row.record.len()
    }

    fn report(&mut self, column: usize, token: &str) {
        self.diagnostics.push(Diagnostic::NumericParseFailure {
            line: self.row.line,
            column: column + 1,
            token: token.to_string(),
        });
    }

    fn float(&mut self, column: usize) -> f64 {
        let row = self.row;
        let Some(field) = row.record.get(column) else {
            return 0.0;
        };
        parse_float(field).unwrap_or_else(|| {
            self.report(column, field);
            0.0
        })
    }

    fn uint(&mut self, column: usize) -> u32 {
        let row = self.row;
        let Some(field) = row.record.get(column) else {
            return 0;
        };
        parse_uint(field).unwrap_or_else(|| {
            self.report(column, field);
            0
        })
    }

    fn vector(&mut self, first_column: usize) -> Vector3<f64> {
        Vector3::new(
            self.float(first_column),
            self.float(first_column + 1),
            self.float(first_column + 2),
        )
    }
}

fn decode_track_rows(rows: &[Row], diagnostics: &mut Vec<Diagnostic>) -> Track {
    let mut track = Track::new();

    for row in rows {
        let mut reader = RowReader::new(row, diagnostics);
        if reader.columns() != TRACK_COLUMNS.len() {
            let message = format!(
                "expected {} track columns, found {}",
                TRACK_COLUMNS.len(),
                reader.columns()
            );
            reader.diagnostics.push(Diagnostic::malformed(row.line, message));
        }

        let longitude = reader.float(0);
        let offset = reader.uint(1);
        let lanes = reader.uint(2);
        track.push_segment(longitude, offset, lanes);
    }

    track
}

fn decode_keyframe(row: &Row, diagnostics: &mut Vec<Diagnostic>) -> Keyframe {
    let mut reader = RowReader::new(row, diagnostics);

    let time = reader.float(0);
    let position = reader.vector(1);
    let velocity = reader.vector(4);

    let orientation = match reader.columns() {
        11 => {
            let x = reader.float(7);
            let y = reader.float(8);
            let z = reader.float(9);
            let w = reader.float(10);
            unit_quaternion_or_identity(x, y, z, w)
        }
        12 => {
            // acceleration is checked but not kept
            let _acceleration = reader.vector(7);
            let heading = reader.float(10);
            let yaw = reader.float(11);
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), heading)
        }
        columns => {
            reader.diagnostics.push(Diagnostic::UnsupportedRowShape {
                line: row.line,
                columns,
            });
            UnitQuaternion::identity()
        }
    };

    Keyframe::new(time, position, velocity, orientation)
}

/// Body of a section whose first line is not the expected title. If that line
/// is already the column header the title is simply missing, otherwise it is
/// an unknown title and is dropped.
fn untitled_body<'s, 'a>(section: &'s [Line<'a>], first_title: &str) -> &'s [Line<'a>] {
    if is_column_header(section[0].text, first_title) {
        section
    } else {
        &section[1..]
    }
}

fn decode_trajectory_section(
    section: &[Line<'_>],
    index: usize,
    role: VehicleRole,
    diagnostics: &mut Vec<Diagnostic>,
) -> Trajectory {
    let title = section[0];
    let (name, body) = match title.text.strip_prefix(TRAJECTORY_PREFIX) {
        Some(name) => (name.trim().to_string(), &section[1..]),
        None => {
            diagnostics.push(Diagnostic::malformed(
                title.number,
                format!("expected '{} <name>' but found '{}'", TRAJECTORY_PREFIX, title.text),
            ));
            (format!("Trajectory_{}", index), untitled_body(section, TRAJECTORY_COLUMNS[0]))
        }
    };

    let mut trajectory = Trajectory::new(name, role);
    for row in read_rows(body, TRAJECTORY_COLUMNS[0], title.number, diagnostics) {
        trajectory.push_keyframe(decode_keyframe(&row, diagnostics));
    }
    trajectory
}

/// Decodes the track section only.
pub fn decode_track(text: &str) -> Decoded<Track> {
    decode(text).map(|scenario| scenario.track)
}

/// Decodes a whole scenario document.
///
/// The first trajectory becomes the ego vehicle, every other one traffic.
/// Never fails; check [`Decoded::diagnostics`] for what had to be repaired.
pub fn decode(text: &str) -> Decoded<Scenario> {
    let mut diagnostics = Vec::new();
    let sections = split_sections(text, &mut diagnostics);

    let mut scenario = Scenario::default();
    let mut remaining: &[Vec<Line<'_>>] = &sections;

    match sections.first() {
        None => {
            diagnostics.push(Diagnostic::malformed(1, "document contains no sections"));
        }
        Some(first) if first[0].text.starts_with(TRAJECTORY_PREFIX) => {
            diagnostics.push(Diagnostic::malformed(first[0].number, "missing 'Track' section"));
        }
        Some(first) => {
            let body = if first[0].text == TRACK_TITLE {
                &first[1..]
            } else {
                diagnostics.push(Diagnostic::malformed(
                    first[0].number,
                    format!("expected '{}' but found '{}'", TRACK_TITLE, first[0].text),
                ));
                untitled_body(first, TRACK_COLUMNS[0])
            };
            let rows = read_rows(body, TRACK_COLUMNS[0], first[0].number, &mut diagnostics);
            scenario.track = decode_track_rows(&rows, &mut diagnostics);
            remaining = &sections[1..];
        }
    }

    for (index, section) in remaining.iter().enumerate() {
        let role = if index == 0 {
            VehicleRole::Ego
        } else {
            VehicleRole::Traffic
        };
        scenario
            .trajectories
            .push(decode_trajectory_section(section, index, role, &mut diagnostics));
    }

    for diagnostic in &diagnostics {
        warn!("scenario document: {}", diagnostic);
    }
    debug!(
        "decoded scenario: {} segments, {} trajectories, {} diagnostics",
        scenario.track.len(),
        scenario.trajectories.len(),
        diagnostics.len()
    );

    Decoded::new(scenario, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample_scenario() -> Scenario {
        let mut track = Track::new();
        track.push_segment(0.0, 0, 2);
        track.push_segment(25.0, 1, 3);
        track.push_segment(50.0, 0, 1);

        let mut ego = Trajectory::ego("Ego");
        ego.add_keyframe(0.0, Vector3::new(0.0, 3.5, 0.0), Vector3::new(15.0, 0.0, 0.0), UnitQuaternion::identity());
        ego.add_keyframe(
            2.0,
            Vector3::new(30.0, 7.0, 0.0),
            Vector3::new(15.5, 0.25, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.3),
        );

        let mut traffic = Trajectory::traffic("Traffic_1");
        traffic.add_keyframe(0.0, Vector3::new(-12.25, 0.0, 0.0), Vector3::new(20.0, 0.0, 0.0), UnitQuaternion::identity());

        Scenario::new(track, vec![traffic, ego])
    }

    #[test]
    fn test_encode_layout() {
        let text = encode(&sample_scenario(), &CodecConfig::default());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Track");
        assert!(lines[2].starts_with("Longitude"));
        assert_eq!(lines[6], SEPARATOR_LINE);
        assert_eq!(lines[8], "Trajectory: Ego");
        assert_eq!(read_records(lines[9]).next().unwrap().unwrap().len(), 11);
        assert!(text.contains("Trajectory: Traffic_1"));
        assert!(text.ends_with("-----\n"));
    }

    #[test]
    fn test_round_trip() {
        let scenario = sample_scenario();
        let config = CodecConfig { decimals: 4 };
        let decoded = decode(&encode(&scenario, &config));

        assert!(decoded.is_clean(), "{:?}", decoded.diagnostics);
        let result = decoded.value;

        assert_eq!(result.track, scenario.track);
        assert_eq!(result.trajectories.len(), 2);

        let ego = result.ego().unwrap();
        assert_eq!(ego.name, "Ego");
        assert_eq!(result.trajectories[0].role, VehicleRole::Ego);
        assert_eq!(result.trajectories[1].role, VehicleRole::Traffic);

        let original = scenario.ego().unwrap();
        for (a, b) in ego.keyframes().iter().zip(original.keyframes()) {
            assert_relative_eq!(a.time, b.time, epsilon = 1e-4);
            assert_relative_eq!(a.position, b.position, epsilon = 1e-4);
            assert_relative_eq!(a.velocity, b.velocity, epsilon = 1e-4);
            assert!(a.orientation.angle_to(&b.orientation) < 1e-3);
        }
    }

    #[test]
    fn test_blank_lines_and_padding_ignored() {
        let text = "\n\n  Track  \n\nLongitude , Offset, Lanes\n\n 0.00 ,   1 , 2.00   \n-----\n\n";
        let decoded = decode(text);
        assert!(decoded.is_clean(), "{:?}", decoded.diagnostics);
        assert_eq!(decoded.value.track.segments()[0].offset, 1);
        assert_eq!(decoded.value.track.segments()[0].lanes, 2);
    }

    #[test]
    fn test_bad_numeric_field_defaults_to_zero() {
        let text = "Track\nLongitude, Offset, Lanes\n0.0, 0, 2\n25.0, x, 3\n50.0, 1, 2\n-----\n\
                    Trajectory: Ego\nt, x, y, z, vx, vy, vz, rx, ry, rz, rw\n\
                    0, 1, 2, 3, 4, 5, 6, 0, 0, 0, 1\n\
                    1, 1, oops, 3, 4, 5, 6, 0, 0, 0, 1\n\
                    2, 1, 2, 3, 4, 5, 6, 0, 0, 0, 1\n-----\n";
        let decoded = decode(text);

        let track = &decoded.value.track;
        assert_eq!(track.len(), 3);
        assert_eq!(track.segments()[1].offset, 0);
        assert_eq!(track.segments()[1].lanes, 3);
        assert_eq!(track.segments()[2].offset, 1);

        let ego = decoded.value.ego().unwrap();
        assert_eq!(ego.len(), 3);
        assert_eq!(ego.keyframes()[1].position.y, 0.0);
        assert_eq!(ego.keyframes()[2].position.y, 2.0);

        assert_eq!(
            decoded.diagnostics,
            vec![
                Diagnostic::NumericParseFailure { line: 4, column: 2, token: "x".into() },
                Diagnostic::NumericParseFailure { line: 10, column: 3, token: "oops".into() },
            ]
        );
    }

    #[test]
    fn test_malformed_headers_are_reported_not_fatal() {
        let text = "Trakc\nLongitude, Offset, Lanes\n0, 0, 1\n-----\nVehicle A\nt, x, y, z, vx, vy, vz, rx, ry, rz, rw\n0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1\n";
        let decoded = decode(text);

        assert_eq!(decoded.value.track.len(), 1);
        assert_eq!(decoded.value.trajectories.len(), 1);
        assert_eq!(decoded.value.trajectories[0].len(), 1);
        assert_eq!(decoded.diagnostics.len(), 2);
        assert!(matches!(decoded.diagnostics[0], Diagnostic::MalformedRecord { line: 1, .. }));
        assert!(matches!(decoded.diagnostics[1], Diagnostic::MalformedRecord { line: 5, .. }));
    }

    #[test]
    fn test_missing_separator_starts_new_section() {
        let text = "Track\nLongitude, Offset, Lanes\n0, 0, 1\n\
                    Trajectory: A\nt, x, y, z, vx, vy, vz, rx, ry, rz, rw\n0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1\n\
                    Trajectory: B\nt, x, y, z, vx, vy, vz, rx, ry, rz, rw\n0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1\n";
        let decoded = decode(text);

        assert_eq!(decoded.value.track.len(), 1);
        let names: Vec<_> = decoded.value.trajectories.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(decoded.diagnostics.len(), 2);
    }

    #[test]
    fn test_legacy_heading_yaw_rows() {
        let text = "Track\nLongitude, Offset, Lanes\n0, 0, 1\n-----\nTrajectory: Legacy\n\
                    t, x, y, z, vx, vy, vz, ax, ay, az, heading, yaw\n\
                    0, 0, 0, 0, 10, 0, 0, 0.5, 0, 0, 0, 1.5707963\n";
        let decoded = decode(text);
        assert!(decoded.is_clean(), "{:?}", decoded.diagnostics);

        let keyframe = decoded.value.trajectories[0].keyframes()[0];
        assert_relative_eq!(keyframe.velocity.x, 10.0);
        let rotated = keyframe.orientation * Vector3::z();
        // yaw of 90 degrees about +y turns +z into +x
        assert_relative_eq!(rotated, Vector3::x(), epsilon = 1e-6);
    }

    #[test]
    fn test_unsupported_row_shape() {
        let text = "Track\nLongitude, Offset, Lanes\n0, 0, 1\n-----\nTrajectory: Short\n\
                    t, x, y, z, vx, vy, vz\n1, 2, 3, 4, 5, 6, 7\n";
        let decoded = decode(text);

        let keyframe = decoded.value.trajectories[0].keyframes()[0];
        assert_eq!(keyframe.time, 1.0);
        assert_eq!(keyframe.velocity, Vector3::new(5.0, 6.0, 7.0));
        assert_eq!(keyframe.orientation, UnitQuaternion::identity());
        assert_eq!(
            decoded.diagnostics,
            vec![Diagnostic::UnsupportedRowShape { line: 7, columns: 7 }]
        );
    }

    #[test]
    fn test_garbled_first_row_is_data_not_header() {
        let text = "Track\nLongitude, Offset, Lanes\n0, 0, 1\n-----\nTrajectory: Ego\n\
                    t, x, y, z, vx, vy, vz, rx, ry, rz, rw\n\
                    a, b, c, d, e, f, g, h, i, j, k\n\
                    1, 2, 3, 4, 5, 6, 7, 0, 0, 0, 1\n";
        let decoded = decode(text);

        let ego = decoded.value.ego().unwrap();
        assert_eq!(ego.len(), 2);
        assert_eq!(ego.keyframes()[0].position, Vector3::zeros());
        assert_eq!(ego.keyframes()[0].orientation, UnitQuaternion::identity());
        assert_eq!(ego.keyframes()[1].time, 1.0);

        assert_eq!(decoded.diagnostics.len(), 11);
        assert!(decoded.diagnostics.iter().enumerate().all(|(i, d)| matches!(
            d,
            Diagnostic::NumericParseFailure { line: 7, column, .. } if *column == i + 1
        )));
    }

    #[test]
    fn test_missing_header_row_is_reported() {
        let text = "Track\nLongitude, Offset, Lanes\n0, 0, 1\n-----\nTrajectory: Ego\n\
                    Time, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1\n";
        let decoded = decode(text);

        assert_eq!(decoded.value.ego().unwrap().len(), 1);
        assert_eq!(
            decoded.diagnostics,
            vec![
                Diagnostic::malformed(6, "missing column header row"),
                Diagnostic::NumericParseFailure { line: 6, column: 1, token: "Time".into() },
            ]
        );
    }

    #[test]
    fn test_names_stay_on_their_title_line() {
        let mut track = Track::new();
        track.push_segment(0.0, 0, 1);
        let mut tricky = Trajectory::ego("A\n-----\nTrajectory: B\r");
        tricky.add_keyframe(0.0, Vector3::zeros(), Vector3::zeros(), UnitQuaternion::identity());
        let scenario = Scenario::new(track, vec![tricky, Trajectory::traffic("  C ")]);

        let decoded = decode(&encode(&scenario, &CodecConfig::default()));
        assert!(decoded.is_clean(), "{:?}", decoded.diagnostics);

        let names: Vec<_> = decoded.value.trajectories.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A ----- Trajectory: B", "C"]);
        assert_eq!(decoded.value.trajectories[0].len(), 1);
    }

    #[test]
    fn test_second_ego_survives_round_trip() {
        let scenario = Scenario::new(Track::new(), vec![Trajectory::ego("A"), Trajectory::ego("B")]);
        let decoded = decode(&encode(&scenario, &CodecConfig::default()));

        let names: Vec<_> = decoded.value.trajectories.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(decoded.value.trajectories[1].role, VehicleRole::Traffic);
    }

    #[test]
    fn test_empty_document() {
        let decoded = decode("\n   \n");
        assert!(decoded.value.track.is_empty());
        assert!(decoded.value.trajectories.is_empty());
        assert_eq!(decoded.diagnostics.len(), 1);
    }

    #[test]
    fn test_document_without_track() {
        let decoded = decode("Trajectory: Ego\nt, x, y, z, vx, vy, vz, rx, ry, rz, rw\n0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1\n");
        assert!(decoded.value.track.is_empty());
        assert_eq!(decoded.value.ego().unwrap().name, "Ego");
        assert_eq!(decoded.diagnostics.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_track_round_trip(rows in proptest::collection::vec((0u32..1_000_000, 0u32..8, 0u32..8), 1..30)) {
            let mut track = Track::new();
            for (cents, offset, lanes) in rows {
                track.push_segment(f64::from(cents) / 100.0, offset, lanes);
            }
            let scenario = Scenario::new(track.clone(), Vec::new());
            let decoded = decode(&encode(&scenario, &CodecConfig::default()));

            prop_assert!(decoded.is_clean());
            let segments = decoded.value.track.segments().to_vec();
            prop_assert_eq!(segments.len(), track.len());
            for (a, b) in segments.iter().zip(track.segments()) {
                prop_assert!((a.longitude - b.longitude).abs() <= 0.005);
                prop_assert_eq!(a.offset, b.offset);
                prop_assert_eq!(a.lanes, b.lanes);
            }
        }
    }
}
