//! Fixed, closed category taxonomy offered to the model.

use std::collections::HashSet;

/// Label used when no taxonomy entry fits.
pub const MISCELLANEOUS: &str = "Miscellaneous";

/// A named group of categories.
#[derive(Debug, Clone, Copy)]
pub struct Domain {
    pub name: &'static str,
    pub categories: &'static [&'static str],
}

impl Domain {
    /// `"<name>: a, b, c"`, one line of the prompt's category list.
    pub fn render(&self) -> String {
        format!("{}: {}", self.name, self.categories.join(", "))
    }
}

pub const TAXONOMY: &[Domain] = &[
    Domain {
        name: "Science & Technology",
        categories: &[
            "Acoustics",
            "Aerospace Engineering",
            "Agronomy",
            "Artificial Intelligence",
            "Astronomy",
            "Astrophysics",
            "Automation",
            "Bioinformatics",
            "Biotechnology",
            "Blockchain",
            "Botany",
            "Chemical Engineering",
            "Civil Engineering",
            "Cloud Computing",
            "Computer Vision",
            "Consumer Electronics",
            "Cryptography",
            "Cybersecurity",
            "Data Science",
            "Ecology",
            "Electrical Engineering",
            "Entomology",
            "Epidemiology",
            "Evolutionary Biology",
            "Forensic Science",
            "Game Development",
            "Genetics",
            "Geology",
            "Hacking",
            "Hydrology",
            "Immunology",
            "Information Technology",
            "Internet of Things (IoT)",
            "Machine Learning",
            "Marine Biology",
            "Materials Science",
            "Mechanical Engineering",
            "Meteorology",
            "Microbiology",
            "Nanotechnology",
            "Neuroscience",
            "Nuclear Physics",
            "Oceanography",
            "Optics",
            "Organic Chemistry",
            "Paleontology",
            "Particle Physics",
            "Pharmacology",
            "Quantum Mechanics",
            "Robotics",
            "Software Engineering",
            "Space Exploration",
            "Sustainability",
            "Telecommunications",
            "Thermodynamics",
            "Toxicology",
            "Virtual Reality (VR)",
            "Web Development",
            "Zoology",
        ],
    },
    Domain {
        name: "Humanities & Social Sciences",
        categories: &[
            "Anthropology",
            "Archaeology",
            "Cognitive Science",
            "Criminology",
            "Demography",
            "Developmental Psychology",
            "Epistemology",
            "Ethics",
            "Ethnography",
            "Gender Studies",
            "Genealogy",
            "Geography",
            "Geopolitics",
            "History (Ancient, Medieval, Modern)",
            "Human Rights",
            "International Relations",
            "Law (Constitutional, Corporate, Criminal)",
            "Linguistics",
            "Logic",
            "Media Studies",
            "Metaphysics",
            "Military History",
            "Mythology",
            "Pedagogy",
            "Philosophy",
            "Political Science",
            "Psychology (Clinical, Social, Behavioral)",
            "Public Administration",
            "Religious Studies",
            "Social Work",
            "Sociology",
            "Theology",
            "Urban Planning",
        ],
    },
    Domain {
        name: "Business & Economics",
        categories: &[
            "Accounting",
            "Advertising",
            "Behavioral Economics",
            "Branding",
            "Business Ethics",
            "Corporate Governance",
            "Cryptocurrency",
            "Digital Marketing",
            "E-commerce",
            "Entrepreneurship",
            "Finance (Personal, Corporate)",
            "Human Resources",
            "Industrial Relations",
            "Insurance",
            "International Trade",
            "Investing",
            "Logistics",
            "Macroeconomics",
            "Management",
            "Microeconomics",
            "Operations Management",
            "Project Management",
            "Real Estate",
            "Sales",
            "Stock Market",
            "Supply Chain Management",
            "Taxation",
            "Venture Capital",
        ],
    },
    Domain {
        name: "Arts, Culture & Media",
        categories: &[
            "Animation",
            "Architecture",
            "Art History",
            "Calligraphy",
            "Cinematography",
            "Creative Writing",
            "Culinary Arts",
            "Dance",
            "Design (Graphic, Industrial, Interior)",
            "Fashion",
            "Film Studies",
            "Fine Arts",
            "Journalism",
            "Literature",
            "Music Theory",
            "Performing Arts",
            "Photography",
            "Poetry",
            "Pop Culture",
            "Publishing",
            "Sculpture",
            "Stand-up Comedy",
            "Television",
            "Textile Design",
            "Theater",
            "Video Games",
            "Visual Arts",
        ],
    },
    Domain {
        name: "Health, Lifestyle & Sports",
        categories: &[
            "Alternative Medicine",
            "Athletic Training",
            "Biohacking",
            "Dental Hygiene",
            "Dermatology",
            "Dietetics",
            "Emergency Medicine",
            "Ergonomics",
            "Fitness",
            "Gastronomy",
            "Geriatrics",
            "Holistic Health",
            "Kinesiology",
            "Meditation",
            "Mental Health",
            "Minimalism",
            "Nursing",
            "Nutrition",
            "Occupational Therapy",
            "Parenting",
            "Pediatrics",
            "Personal Development",
            "Physical Therapy",
            "Productivity",
            "Psychiatry",
            "Public Health",
            "Sports Management",
            "Sports Psychology",
            "Sports Science",
            "Survivalism",
            "Travel & Tourism",
            "Veterinary Medicine",
            "Wellness",
            "Yoga",
        ],
    },
    Domain {
        name: "Niche & Miscellaneous",
        categories: &[
            "Astrology",
            "Aviation",
            "Bibliophilia",
            "Carpentry",
            "Chess",
            "Collecting (Philately, Numismatics)",
            "Conspiracy Theories",
            "Cryptozoology",
            "DIY & Making",
            "Esotericism",
            "Etiquette",
            "Futurism",
            "Gardening",
            "Genealogy",
            "Horticulture",
            "Magic (Illusion)",
            "Maritime Studies",
            "Military Strategy",
            "Numismatics",
            "Occultism",
            "Parapsychology",
            "Philanthropy",
            "Survival Skills",
            "Transhumanism",
            "True Crime",
            "Vexillology (Flags)",
        ],
    },];

/// Look up a label, ignoring case and surrounding whitespace.
/// Returns the canonical spelling.
pub fn canonical(label: &str) -> Option<&'static str> {
    let label = label.trim();
    if label.eq_ignore_ascii_case(MISCELLANEOUS) {
        return Some(MISCELLANEOUS);
    }
    TAXONOMY
        .iter()
        .flat_map(|domain| domain.categories.iter().copied())
        .find(|category| category.eq_ignore_ascii_case(label))
}

/// Keep only taxonomy labels (canonically spelled, first occurrence order).
/// Falls back to [`MISCELLANEOUS`] when nothing survives.
pub fn normalize_categories(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = raw
        .iter()
        .filter_map(|label| canonical(label))
        .filter(|label| seen.insert(*label))
        .map(str::to_string)
        .collect();

    // "Miscellaneous" alongside a real category adds nothing.
    if out.len() > 1 {
        out.retain(|label| label != MISCELLANEOUS);
    }
    if out.is_empty() {
        out.push(MISCELLANEOUS.to_string());
    }
    out
}
