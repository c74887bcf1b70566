//! The reference tables a cleaning run maps against.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::info;

use dcqa_model::ReferenceTable;

use crate::csv_io::read_table;
use crate::error::{Result, TaxonomyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyFile {
    Brands,
    Vendors,
    Campaigns,
    Channels,
    FxRates,
    Cbht,
}

impl TaxonomyFile {
    pub const ALL: [Self; 6] = [
        Self::Brands,
        Self::Vendors,
        Self::Campaigns,
        Self::Channels,
        Self::FxRates,
        Self::Cbht,
    ];

    /// Tables the budgets pipeline reads.
    pub const BUDGETS: [Self; 2] = [Self::Channels, Self::FxRates];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Brands => "brands",
            Self::Vendors => "vendors",
            Self::Campaigns => "campaigns",
            Self::Channels => "channels",
            Self::FxRates => "fx_rates",
            Self::Cbht => "cbht",
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn path_in(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for TaxonomyFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference tables keyed by role. Tables not requested at load time are empty.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub brands: ReferenceTable,
    pub vendors: ReferenceTable,
    pub campaigns: ReferenceTable,
    pub channels: ReferenceTable,
    pub fx_rates: ReferenceTable,
    pub cbht: ReferenceTable,
}

impl Taxonomy {
    /// Loads every table from `dir`; each must exist.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_only(dir, &TaxonomyFile::ALL)
    }

    /// Loads the `required` tables, failing on the first one that is absent.
    pub fn load_only(dir: &Path, required: &[TaxonomyFile]) -> Result<Self> {
        let mut taxonomy = Self::default();
        for file in required {
            let path = file.path_in(dir);
            if !path.is_file() {
                return Err(TaxonomyError::MissingTable {
                    name: file.name().to_string(),
                    path,
                });
            }
            *taxonomy.table_mut(*file) = read_table(&path, file.name())?;
        }
        info!(
            dir = %dir.display(),
            tables = required.len(),
            brands = taxonomy.brands.len(),
            fx_rates = taxonomy.fx_rates.len(),
            "loaded taxonomy"
        );
        Ok(taxonomy)
    }

    pub fn table(&self, file: TaxonomyFile) -> &ReferenceTable {
        match file {
            TaxonomyFile::Brands => &self.brands,
            TaxonomyFile::Vendors => &self.vendors,
            TaxonomyFile::Campaigns => &self.campaigns,
            TaxonomyFile::Channels => &self.channels,
            TaxonomyFile::FxRates => &self.fx_rates,
            TaxonomyFile::Cbht => &self.cbht,
        }
    }

    fn table_mut(&mut self, file: TaxonomyFile) -> &mut ReferenceTable {
        match file {
            TaxonomyFile::Brands => &mut self.brands,
            TaxonomyFile::Vendors => &mut self.vendors,
            TaxonomyFile::Campaigns => &mut self.campaigns,
            TaxonomyFile::Channels => &mut self.channels,
            TaxonomyFile::FxRates => &mut self.fx_rates,
            TaxonomyFile::Cbht => &mut self.cbht,
        }
    }
}
