//! Folding individual module maps into one map per stylesheet.

use sourcemap::{SourceMap, SourceMapBuilder};
use std::collections::HashMap;

/// Errors raised while merging maps
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("Failed to decode source map: {0}")]
    Decode(#[source] sourcemap::Error),

    #[error("Failed to encode merged source map: {0}")]
    Encode(String),
}

/// Accumulated result of merging zero or more maps
#[derive(Debug, Clone, Default)]
pub enum MergedMap {
    /// No map folded in yet
    #[default]
    Empty,

    /// Exactly one map, kept as the text it was emitted with
    Verbatim(String),

    /// Two or more maps combined
    Combined(SourceMap),
}

impl MergedMap {
    pub fn is_empty(&self) -> bool {
        matches!(self, MergedMap::Empty)
    }

    /// Text of the merged map asset. An empty merge serializes as `null`.
    pub fn to_source_text(&self) -> Result<String, MergeError> {
        match self {
            MergedMap::Empty => Ok(serde_json::Value::Null.to_string()),
            MergedMap::Verbatim(text) => Ok(text.clone()),
            MergedMap::Combined(map) => {
                let mut buf = Vec::new();
                map.to_writer(&mut buf)
                    .map_err(|e| MergeError::Encode(e.to_string()))?;
                String::from_utf8(buf).map_err(|e| MergeError::Encode(e.to_string()))
            }
        }
    }
}

/// Folds `next` into `merged`
///
/// The first map is adopted as-is. Later maps are combined: sources, source
/// contents and names are unioned (first occurrence wins) and the mappings of
/// both are ordered by generated position, accumulated ones first on ties. A
/// missing `next` leaves the accumulator unchanged.
///
/// Generated positions are not shifted. Each module's map describes its
/// stylesheet as if it started at line 0 of the asset, so tokens from
/// different modules overlap and a position lookup resolves to whichever
/// module's token sorts last at or before it.
pub fn merge_source_map(merged: MergedMap, next: Option<&str>) -> Result<MergedMap, MergeError> {
    let Some(next) = next else {
        return Ok(merged);
    };

    let previous = match merged {
        MergedMap::Empty => return Ok(MergedMap::Verbatim(next.to_string())),
        MergedMap::Verbatim(text) => decode(&text)?,
        MergedMap::Combined(map) => map,
    };

    Ok(MergedMap::Combined(combine(&previous, &decode(next)?)))
}

fn decode(text: &str) -> Result<SourceMap, MergeError> {
    SourceMap::from_slice(text.as_bytes()).map_err(MergeError::Decode)
}

fn combine(previous: &SourceMap, next: &SourceMap) -> SourceMap {
    let mut builder = SourceMapBuilder::new(previous.get_file());
    let mut sources = HashMap::new();
    let mut names = HashMap::new();
    let mut tokens = Vec::new();

    append_map(&mut builder, previous, &mut sources, &mut names, &mut tokens);
    append_map(&mut builder, next, &mut sources, &mut names, &mut tokens);

    // Encoding walks generated lines forward only.
    tokens.sort_by_key(|token| (token.dst_line, token.dst_col));
    for token in tokens {
        builder.add_raw(
            token.dst_line,
            token.dst_col,
            token.src_line,
            token.src_col,
            token.source,
            token.name,
        );
    }

    builder.into_sourcemap()
}

/// A token with source and name ids already remapped into the builder
struct RemappedToken {
    dst_line: u32,
    dst_col: u32,
    src_line: u32,
    src_col: u32,
    source: Option<u32>,
    name: Option<u32>,
}

fn append_map(
    builder: &mut SourceMapBuilder,
    map: &SourceMap,
    sources: &mut HashMap<String, u32>,
    names: &mut HashMap<String, u32>,
    tokens: &mut Vec<RemappedToken>,
) {
    let source_ids: Vec<u32> = (0..map.get_source_count())
        .map(|idx| {
            let source = map.get_source(idx).unwrap_or_default();
            *sources.entry(source.to_string()).or_insert_with(|| {
                let id = builder.add_source(source);
                builder.set_source_contents(id, map.get_source_contents(idx));
                id
            })
        })
        .collect();

    let name_ids: Vec<u32> = (0..map.get_name_count())
        .map(|idx| {
            let name = map.get_name(idx).unwrap_or_default();
            *names
                .entry(name.to_string())
                .or_insert_with(|| builder.add_name(name))
        })
        .collect();

    tokens.extend(map.tokens().map(|token| {
        let raw = token.get_raw_token();
        RemappedToken {
            dst_line: raw.dst_line,
            dst_col: raw.dst_col,
            src_line: raw.src_line,
            src_col: raw.src_col,
            source: source_ids.get(raw.src_id as usize).copied(),
            name: name_ids.get(raw.name_id as usize).copied(),
        }
    }));
}
