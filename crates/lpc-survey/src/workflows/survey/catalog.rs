use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::ProjectId;

/// Immutable catalog entry for a proposed project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub location: String,
    pub description: String,
    #[serde(alias = "nyForwardRequest")]
    pub funding_request: u64,
    pub total_cost: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FundingOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Project {
    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn option(&self, key: &str) -> Option<&FundingOption> {
        self.options.iter().find(|option| option.key == key)
    }
}

/// Alternative funding scenario for a project, each with its own amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingOption {
    pub key: String,
    pub label: String,
    pub funding_request: u64,
    pub total_cost: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read project catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed project catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed project catalog CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported catalog format '{0}' (expected .json or .csv)")]
    UnsupportedFormat(String),
    #[error("project catalog is empty")]
    Empty,
    #[error("project ids must be positive")]
    InvalidId,
    #[error("project {0} appears more than once")]
    DuplicateProject(ProjectId),
    #[error("project {project} defines option '{key}' more than once")]
    DuplicateOption { project: ProjectId, key: String },
    #[error("project {0} defines a single funding option; options must offer a choice")]
    LoneOption(ProjectId),
}

/// Ordered, validated slate of projects under review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    pub fn new(projects: Vec<Project>) -> Result<Self, CatalogError> {
        if projects.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut ids = BTreeSet::new();
        for project in &projects {
            if project.id.0 == 0 {
                return Err(CatalogError::InvalidId);
            }
            if !ids.insert(project.id) {
                return Err(CatalogError::DuplicateProject(project.id));
            }
            if project.options.len() == 1 {
                return Err(CatalogError::LoneOption(project.id));
            }
            let mut keys = BTreeSet::new();
            for option in &project.options {
                if !keys.insert(option.key.as_str()) {
                    return Err(CatalogError::DuplicateOption {
                        project: project.id,
                        key: option.key.clone(),
                    });
                }
            }
        }

        Ok(Self { projects })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Self::from_json_reader(std::fs::File::open(path)?),
            "csv" => Self::from_csv_reader(std::fs::File::open(path)?),
            _ => Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let projects: Vec<Project> = serde_json::from_reader(reader)?;
        Self::new(projects)
    }

    /// One row per project, or one row per funding option with the project columns repeated.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut projects: Vec<Project> = Vec::new();

        for record in csv_reader.deserialize::<CatalogRow>() {
            let row = record?;
            let id = ProjectId(row.id);

            let option = match (row.option_key, row.option_request) {
                (Some(key), Some(funding_request)) => Some(FundingOption {
                    label: row.option_label.unwrap_or_else(|| key.clone()),
                    key,
                    funding_request,
                    total_cost: row.option_cost.unwrap_or(funding_request),
                }),
                _ => None,
            };

            match projects.last_mut() {
                Some(project) if project.id == id => {
                    if let Some(option) = option {
                        project.options.push(option);
                    }
                }
                _ => projects.push(Project {
                    id,
                    title: row.title,
                    location: row.location,
                    description: row.description,
                    funding_request: row.funding_request,
                    total_cost: row.total_cost,
                    options: option.into_iter().collect(),
                    image: row.image,
                }),
            }
        }

        Self::new(projects)
    }

    /// The eighteen projects on the Brockport NY Forward slate.
    pub fn brockport() -> Self {
        Self {
            projects: brockport_projects(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Project> {
        self.projects.get(index)
    }

    pub fn ids(&self) -> impl Iterator<Item = ProjectId> + '_ {
        self.projects.iter().map(|project| project.id)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: u32,
    title: String,
    location: String,
    description: String,
    funding_request: u64,
    total_cost: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    option_key: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    option_label: Option<String>,
    #[serde(default)]
    option_request: Option<u64>,
    #[serde(default)]
    option_cost: Option<u64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    image: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn project(
    id: u32,
    title: &str,
    location: &str,
    description: &str,
    funding_request: u64,
    total_cost: u64,
) -> Project {
    Project {
        id: ProjectId(id),
        title: title.to_string(),
        location: location.to_string(),
        description: description.to_string(),
        funding_request,
        total_cost,
        options: Vec::new(),
        image: Some(format!("/images/project-{id}.jpg")),
    }
}

fn brockport_projects() -> Vec<Project> {
    let mut grant_fund = project(
        18,
        "Establish a Small Project Grant Fund",
        "NY Forward Area",
        "The Small Project Grant Fund will provide financial assistance to property and business owners for building improvements, facades, renovations, signage, equipment, and public art installations to strengthen Brockport's historic character and support downtown businesses, covering up to 75% of project costs with recipients providing a 25% match.",
        300000,
        390000,
    );
    grant_fund.options = vec![
        FundingOption {
            key: "standard".to_string(),
            label: "Standard fund".to_string(),
            funding_request: 300000,
            total_cost: 390000,
        },
        FundingOption {
            key: "expanded".to_string(),
            label: "Expanded fund".to_string(),
            funding_request: 500000,
            total_cost: 650000,
        },
    ];

    vec![
        project(
            1,
            "Create an Accessible Venue at the Brockport Welcome Center",
            "11 Water Street (Brockport Welcome Center)",
            "This project will retrofit and expand accessible outdoor seating at the Brockport Welcome Center to enhance waterfront amenities for residents and Erie Canal visitors.",
            150000,
            150000,
        ),
        project(
            2,
            "Enhance the Clinton Street Streetscape",
            "Clinton Street from Main Street to Utica Street",
            "This project will enhance Clinton Street with wider sidewalks, improved lighting, crosswalks, landscaping, and road repaving to create safer pedestrian access connecting downtown, SUNY Brockport, and the Erie Canal waterfront.",
            1000000,
            1000000,
        ),
        project(
            3,
            "Enhance the Main Street Streetscape",
            "Main Street from the Main Street Bridge to Holley Street",
            "This project will revitalize Main Street's historic commercial district by replacing sidewalks, protecting street trees, modernizing LED lighting with power connections for events, and adding bike racks.",
            2000000,
            2000000,
        ),
        project(
            4,
            "Develop a Downtown Branding and Marketing Strategy",
            "Downtown Brockport",
            "This project will develop a comprehensive marketing and branding initiative to strengthen the village's identity as a premier canalfront destination and attract more residents, employers, and visitors.",
            300000,
            300000,
        ),
        project(
            5,
            "Enhance Accessibility at St. Luke's Episcopal Church",
            "14 State Street",
            "This project will rehabilitate the historic St. Luke's Episcopal Church to enhance accessibility to the Brockport Ecumenical Food Shelf and Clothing Center with an elevator, ADA entry repairs, and a basement renovation.",
            500000,
            550000,
        ),
        project(
            6,
            "Modernize Brockport Fire Station",
            "38 Market Street",
            "This project will replace eight overhead bay doors with aluminum full-view doors for improved thermal performance, enhancing the downtown streetscape while improving operational efficiency.",
            102250,
            205428,
        ),
        project(
            7,
            "Enhance 2 Main Street as a Canal Gateway",
            "2 Main Street",
            "This project will enhance the mixed-use property at 2 Main Street with improvements to its three storefronts and six apartments, new parking, roofing, siding, windows, and canal-side landscaping.",
            100000,
            200000,
        ),
        project(
            8,
            "Revitalize Blighted Property at 41 Clark Street with New Townhomes",
            "41 Clark Street",
            "This project will demolish a blighted single-family home and barn to construct four buildings with 12 townhomes. Note: This project is located outside the NY Forward Area.",
            800000,
            3466011,
        ),
        project(
            9,
            "Improve Accessibility at the Lift Bridge Book Shop",
            "45 Main Street",
            "This project will modify the front entrance to meet ADA requirements, install interior ramp access, construct an accessible bathroom, and replace deteriorating facades, windows, and exterior walls.",
            500000,
            550000,
        ),
        project(
            10,
            "Restore Upper Floor Apartments and Facade at 46-50 Main Street",
            "46-50 Main Street",
            "This project will restore three vacant third-floor apartment units, increasing residential units from two to five, and replace the 1970s vinyl siding with historically appropriate brickwork.",
            263392,
            526785,
        ),
        project(
            11,
            "Develop Sustainable Mixed-Income Apartments at 60-90 Clinton Street",
            "60-90 Clinton Street",
            "This project will transform a vacant lot into a 25-unit all-electric apartment building serving households earning up to 80% of Area Median Income.",
            1500000,
            8484033,
        ),
        project(
            12,
            "Upgrade 73 Main Street Exterior Facade and Accessibility",
            "73 Main Street",
            "This project will improve the exterior facade, install energy-efficient windows, replace the steep stairway, and install a stair lift for improved accessibility.",
            55275,
            110550,
        ),
        project(
            13,
            "Construct New Mixed-Use Building on Vacant Main Street Lot",
            "173 Main Street",
            "This project will construct a 3,000-square foot mixed-use building with Main Street-facing retail space and three one-bedroom apartments. Note: This project is located outside the NY Forward Area.",
            300000,
            600000,
        ),
        project(
            14,
            "Complete Historic Bed and Breakfast Restoration at 205 Park Avenue",
            "205 Park Avenue",
            "This project will complete the restoration of a historic Victorian hotel turned bed and breakfast, adding a guest room, restoring the front porch, and adding an accessibility ramp. Note: This project is located outside the NY Forward Area.",
            41665,
            83331,
        ),
        project(
            15,
            "Restore the Morgan Manning House Post-Fire",
            "151 Main Street",
            "This project will restore the Morgan-Manning House after the January 2025 fire and enhance museum accessibility with an ADA ramp, restructured restrooms, and a widened driveway.",
            108968,
            108968,
        ),
        project(
            16,
            "Replace Roof at 43 Main Street",
            "43 Main Street",
            "This project will replace the roof and decorative architectural overhangs at the historic 43 Main Street mixed-use building.",
            300000,
            300000,
        ),
        project(
            17,
            "Renovate 2 Market Street Apartment",
            "2 Market Street",
            "This project will completely renovate a 600-square foot apartment unit with new ceilings, floors, windows, HVAC, plumbing, and structural improvements.",
            300000,
            300000,
        ),
        grant_fund,
    ]
}
