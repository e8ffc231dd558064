//! This module contains the index from the places where a program uses a
//! symbol to the places where that symbol is defined.
//!
//! Alongside its result, the verifier reports every use site that it resolved,
//! grouped by the file the use occurs in:
//!
//! ```text
//! [["main.c", [[[12, 5, 9], 0, [3, 6, 10]], [[14, 1, 15, 4], 1, [1, 1, 1, 8]]]]]
//! ```
//!
//! Each use site pairs the [`VfRange`] of the use with the index of the file
//! that defines it (counting the files in the order they are reported) and the
//! range of the definition. Positions inside a range resolve to its
//! definition, with the end of a range counting as inside it.

use std::{collections::BTreeMap, fmt};

use serde::{
    de::{self, SeqAccess, Visitor},
    Deserialize,
    Deserializer,
};
use tracing::debug;

use crate::{
    context::{LineColumn, SourceRange},
    error::{self, container::Locatable, location},
};

/// A range of source text as the verifier reports it, with 1-based lines and
/// columns.
///
/// On the wire a range is either `[line, start_column, end_column]` when it
/// lies on a single line, or `[start_line, start_column, end_line,
/// end_column]`.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct VfRange {
    pub start_line:   u32,
    pub start_column: u32,
    pub end_line:     u32,
    pub end_column:   u32,
}

impl VfRange {
    /// Constructs a range spanning from `start` to `end`, each given as a
    /// 1-based `(line, column)` pair.
    #[must_use]
    pub fn new(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start_line:   start.0,
            start_column: start.1,
            end_line:     end.0,
            end_column:   end.1,
        }
    }

    /// Constructs a range from `start_column` to `end_column` on `line`.
    #[must_use]
    pub fn single_line(line: u32, start_column: u32, end_column: u32) -> Self {
        Self::new((line, start_column), (line, end_column))
    }

    /// Converts the range to 0-based start and end positions.
    fn zero_based(&self) -> location::Result<(LineColumn, LineColumn)> {
        let start = LineColumn::from_one_based(self.start_line, self.start_column)?;
        let end = LineColumn::from_one_based(self.end_line, self.end_column)?;

        Ok((start, end))
    }
}

struct VfRangeVisitor;

impl<'de> Visitor<'de> for VfRangeVisitor {
    type Value = VfRange;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a range of three or four line and column numbers")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<VfRange, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut numbers = [0u32; 4];
        let mut count = 0;
        while let Some(number) = seq.next_element()? {
            if count == numbers.len() {
                return Err(de::Error::invalid_length(count + 1, &self));
            }
            numbers[count] = number;
            count += 1;
        }

        match (count, numbers) {
            (3, [line, start, end, _]) => Ok(VfRange::single_line(line, start, end)),
            (4, [start_line, start, end_line, end]) => {
                Ok(VfRange::new((start_line, start), (end_line, end)))
            }
            _ => Err(de::Error::invalid_length(count, &self)),
        }
    }
}

impl<'de> Deserialize<'de> for VfRange {
    fn deserialize<D>(deserializer: D) -> Result<VfRange, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(VfRangeVisitor)
    }
}

/// A use of a symbol together with where that symbol is defined.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UseSite {
    /// Where the symbol is used.
    pub use_range: VfRange,

    /// The index of the defining file among the reported files.
    pub definition_file: usize,

    /// Where the symbol is defined.
    pub definition_range: VfRange,
}

/// Use sites arrive as `[use_range, definition_file, definition_range]`.
impl<'de> Deserialize<'de> for UseSite {
    fn deserialize<D>(deserializer: D) -> Result<UseSite, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (use_range, definition_file, definition_range) =
            <(VfRange, usize, VfRange)>::deserialize(deserializer)?;
        Ok(UseSite {
            use_range,
            definition_file,
            definition_range,
        })
    }
}

/// The use sites that occur in a single file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UseSiteFile {
    pub path: String,

    pub sites: Vec<UseSite>,
}

/// Files arrive as `[path, sites]` pairs.
impl<'de> Deserialize<'de> for UseSiteFile {
    fn deserialize<D>(deserializer: D) -> Result<UseSiteFile, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (path, sites) = <(String, Vec<UseSite>)>::deserialize(deserializer)?;
        Ok(UseSiteFile { path, sites })
    }
}

/// A use site resolved against the reported files.
#[derive(Clone, Debug, Eq, PartialEq)]
struct IndexedSite {
    start: LineColumn,
    end:   LineColumn,

    definition: SourceRange,
}

/// Use sites grouped by the path of the file they occur in, each group sorted
/// by where the uses start.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UseSiteIndex {
    sites: BTreeMap<String, Vec<IndexedSite>>,
}

impl UseSiteIndex {
    /// Indexes the use sites reported in `files`.
    ///
    /// # Errors
    ///
    /// If a range is not 1-based, or if a use site refers to a file that was
    /// not reported. The error carries the position of the offending use site
    /// when counting the sites of all files in the order they were reported.
    pub fn new(files: Vec<UseSiteFile>) -> error::Result<Self> {
        let paths: Vec<String> = files.iter().map(|file| file.path.clone()).collect();
        let mut sites: BTreeMap<String, Vec<IndexedSite>> = BTreeMap::new();

        let mut position = 0;
        for file in files {
            let group = sites.entry(file.path).or_default();
            for site in &file.sites {
                let indexed = resolve(site, &paths)
                    .map_err(|e| error::Error::from(e).locate(position))?;
                group.push(indexed);
                position += 1;
            }
        }
        for group in sites.values_mut() {
            group.sort_by_key(|site| site.start);
        }

        debug!(files = sites.len(), sites = position, "Indexed use sites");

        Ok(Self { sites })
    }

    /// Finds the definition of the symbol used at the 0-based `position` in
    /// the file at `path`.
    ///
    /// A use that starts exactly at `position` is preferred. Otherwise the
    /// closest use starting before `position` is taken, provided that
    /// `position` does not lie past its end.
    #[must_use]
    pub fn definition(&self, path: &str, position: LineColumn) -> Option<&SourceRange> {
        let sites = self.sites.get(path)?;
        let index = sites.partition_point(|site| site.start < position);

        if let Some(site) = sites.get(index).filter(|site| site.start == position) {
            return Some(&site.definition);
        }

        let previous = sites.get(index.checked_sub(1)?)?;
        (position <= previous.end).then_some(&previous.definition)
    }

    /// Gets the number of use sites in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.values().all(Vec::is_empty)
    }
}

/// Resolves `site` against the reported file `paths`.
fn resolve(site: &UseSite, paths: &[String]) -> location::Result<IndexedSite> {
    let (start, end) = site.use_range.zero_based()?;
    let path = paths
        .get(site.definition_file)
        .ok_or(location::Error::UnknownDefinitionFile {
            index: site.definition_file,
            files: paths.len(),
        })?;
    let (definition_start, definition_end) = site.definition_range.zero_based()?;

    Ok(IndexedSite {
        start,
        end,
        definition: SourceRange {
            path:  path.clone(),
            start: definition_start,
            end:   definition_end,
        },
    })
}
