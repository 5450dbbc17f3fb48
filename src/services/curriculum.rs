use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Resources a learner has finished. Ordered so listings are stable.
pub type CompletedSet = BTreeSet<String>;

#[derive(Debug, thiserror::Error)]
pub enum CurriculumError {
    #[error("failed to read curriculum: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid curriculum: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub resources: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurriculumFile {
    #[serde(default)]
    prerequisites: HashMap<String, Vec<String>>,
    #[serde(default)]
    learning_paths: serde_json::Map<String, serde_json::Value>,
}

const BUILTIN_PREREQUISITES: &[(&str, &[&str])] = &[
    ("Logical Equivalence", &["Introduction to Mathematical Logic"]),
    ("Rules of Inference", &["Introduction to Mathematical Logic", "Logical Equivalence"]),
    ("Resolution", &["Logical Equivalence", "Rules of Inference"]),
    ("SAT Problem", &["Logical Equivalence", "Rules of Inference"]),
    ("Tutorial 1: Part I", &["Introduction to Mathematical Logic", "Logical Equivalence"]),
    ("Tutorial 1: Part II", &["Tutorial 1: Part I", "Rules of Inference"]),
    ("Predicate Logic", &["Rules of Inference", "Resolution"]),
    ("Rules of Inferences in Predicate Logic", &["Predicate Logic"]),
    ("Proof Strategies I", &["Rules of Inference", "Predicate Logic"]),
    ("Proof Strategies II", &["Proof Strategies I"]),
    ("Induction", &["Proof Strategies I"]),
    ("Tutorial 2: Part I", &["Predicate Logic", "Proof Strategies I"]),
    ("Tutorial 2: Part II", &["Tutorial 2: Part I", "Induction"]),
    ("Sets", &["Introduction to Mathematical Logic"]),
    ("Relations", &["Sets"]),
    ("Operations on Relations", &["Relations"]),
    ("Transitive Closure of Relations", &["Relations", "Operations on Relations"]),
    ("Warshall's Algorithm for Computing Transitive Closure", &["Transitive Closure of Relations"]),
    ("Tutorial 3", &["Relations", "Operations on Relations"]),
    ("Equivalence Relation", &["Relations", "Operations on Relations"]),
    ("Equivalence Relations and Partitions", &["Equivalence Relation"]),
    ("Partial Ordering", &["Relations", "Equivalence Relation"]),
    ("Functions", &["Relations", "Sets"]),
    ("Tutorial 4: Part I", &["Equivalence Relation", "Functions"]),
    ("Tutorial 4: Part II", &["Tutorial 4: Part I", "Partial Ordering"]),
    ("Countable and Uncountable Sets", &["Sets", "Functions"]),
    ("Examples of Countably Infinite Sets", &["Countable and Uncountable Sets"]),
    ("Cantor's Diagonalization Argument", &["Countable and Uncountable Sets"]),
    ("Uncomputable Functions", &["Functions", "Cantor's Diagonalization Argument"]),
    ("Tutorial 5", &["Countable and Uncountable Sets", "Functions"]),
    ("Basic Rules of Counting", &["Sets"]),
    ("Permutation and Combination", &["Basic Rules of Counting"]),
    ("Counting Using Recurrence Equations", &["Permutation and Combination"]),
    (
        "Solving Linear Homogeneous Recurrence Equations - Part I",
        &["Counting Using Recurrence Equations"],
    ),
    (
        "Solving Linear Homogeneous Recurrence Equations - Part II",
        &["Solving Linear Homogeneous Recurrence Equations - Part I"],
    ),
    ("Tutorial 6: Part I", &["Permutation and Combination"]),
    ("Tutorial 6: Part II", &["Tutorial 6: Part I", "Counting Using Recurrence Equations"]),
    (
        "Solving Linear Non-Homogeneous Recurrence Equations",
        &["Solving Linear Homogeneous Recurrence Equations - Part II"],
    ),
    ("Catalan Numbers", &["Counting Using Recurrence Equations"]),
    ("Catalan Numbers - Derivation of Closed Form Formula", &["Catalan Numbers"]),
    (
        "Counting Using Principle of Inclusion-Exclusion",
        &["Basic Rules of Counting", "Permutation and Combination"],
    ),
    ("Tutorial 7", &["Catalan Numbers", "Counting Using Principle of Inclusion-Exclusion"]),
    ("Graph Theory Basics", &["Sets", "Relations"]),
    ("Matching", &["Graph Theory Basics"]),
    ("Proof of Hall's Marriage Theorem", &["Matching"]),
    ("Various Operations on Graphs", &["Graph Theory Basics"]),
    ("Vertex and Edge Connectivity", &["Graph Theory Basics", "Various Operations on Graphs"]),
    ("Tutorial 8", &["Graph Theory Basics", "Matching"]),
    ("Euler Path and Euler Circuit", &["Graph Theory Basics", "Vertex and Edge Connectivity"]),
    ("Hamiltonian Circuit", &["Graph Theory Basics", "Euler Path and Euler Circuit"]),
    ("Vertex and Edge Coloring", &["Graph Theory Basics", "Various Operations on Graphs"]),
    ("Tutorial 9: Part I", &["Euler Path and Euler Circuit", "Hamiltonian Circuit"]),
    ("Tutorial 9: Part II", &["Tutorial 9: Part I", "Vertex and Edge Coloring"]),
    ("Modular Arithmetic", &["Basic Rules of Counting"]),
    ("Prime Numbers and GCD", &["Modular Arithmetic"]),
    ("Properties of GCD and Bézout's Theorem", &["Prime Numbers and GCD"]),
    (
        "Linear Congruence Equations and Chinese Remainder Theorem",
        &["Properties of GCD and Bézout's Theorem"],
    ),
    ("Uniqueness Proof of the CRT", &["Linear Congruence Equations and Chinese Remainder Theorem"]),
    (
        "Fermat's Little Theorem, Primality Testing and Carmichael Numbers",
        &["Prime Numbers and GCD", "Modular Arithmetic"],
    ),
    ("Group Theory", &["Modular Arithmetic", "Properties of GCD and Bézout's Theorem"]),
    ("Cyclic Groups", &["Group Theory"]),
    ("Subgroups", &["Group Theory"]),
    ("More Applications of Groups", &["Cyclic Groups", "Subgroups"]),
    (
        "Discrete Logarithm and Cryptographic Applications",
        &["Cyclic Groups", "Fermat's Little Theorem, Primality Testing and Carmichael Numbers"],
    ),
    ("Rings, Fields and Polynomials", &["Group Theory"]),
    ("Polynomials Over Fields and Properties", &["Rings, Fields and Polynomials"]),
    ("Finite Fields and Properties I", &["Rings, Fields and Polynomials"]),
    (
        "Finite Fields and Properties II",
        &["Finite Fields and Properties I", "Polynomials Over Fields and Properties"],
    ),
    ("Primitive Element of a Finite Field", &["Finite Fields and Properties I"]),
    (
        "Applications of Finite Fields",
        &["Finite Fields and Properties II", "Primitive Element of a Finite Field"],
    ),
];

const BUILTIN_LEARNING_PATHS: &[(&str, &[&str])] = &[
    (
        "basic_logic",
        &[
            "Introduction to Mathematical Logic",
            "Logical Equivalence",
            "Rules of Inference",
            "Tutorial 1: Part I",
            "Tutorial 1: Part II",
        ],
    ),
    (
        "predicate_logic",
        &[
            "Introduction to Mathematical Logic",
            "Logical Equivalence",
            "Rules of Inference",
            "Predicate Logic",
            "Rules of Inferences in Predicate Logic",
            "Tutorial 2: Part I",
        ],
    ),
    (
        "set_theory",
        &[
            "Introduction to Mathematical Logic",
            "Sets",
            "Relations",
            "Operations on Relations",
            "Tutorial 3",
        ],
    ),
    (
        "graph_theory",
        &[
            "Sets",
            "Relations",
            "Graph Theory Basics",
            "Matching",
            "Euler Path and Euler Circuit",
            "Tutorial 8",
        ],
    ),
    (
        "number_theory",
        &[
            "Basic Rules of Counting",
            "Modular Arithmetic",
            "Prime Numbers and GCD",
            "Properties of GCD and Bézout's Theorem",
            "Group Theory",
        ],
    ),
    (
        "complete_course",
        &[
            "Introduction to Mathematical Logic",
            "Logical Equivalence",
            "Rules of Inference",
            "Predicate Logic",
            "Sets",
            "Relations",
            "Functions",
            "Basic Rules of Counting",
            "Graph Theory Basics",
            "Modular Arithmetic",
            "Group Theory",
            "Applications of Finite Fields",
        ],
    ),
];
/// Prerequisite graph plus the named learning paths a goal can select.
///
/// The graph is expected to be acyclic but this is not enforced: resources on
/// a cycle simply never become available. [`Curriculum::find_cycle`] exists so
/// startup can report such data.
#[derive(Debug, Clone)]
pub struct Curriculum {
    prerequisites: HashMap<String, Vec<String>>,
    paths: Vec<LearningPath>,
    default_goal: String,
}

impl Curriculum {
    pub fn new(
        prerequisites: HashMap<String, Vec<String>>,
        paths: Vec<LearningPath>,
        default_goal: &str,
    ) -> Self {
        let mut curriculum = Self {
            prerequisites,
            paths,
            default_goal: String::new(),
        };
        curriculum.set_default_goal(default_goal);
        curriculum
    }

    /// The discrete-mathematics course the service ships with.
    pub fn builtin(default_goal: &str) -> Self {
        let prerequisites = BUILTIN_PREREQUISITES
            .iter()
            .map(|(name, reqs)| {
                (
                    name.to_string(),
                    reqs.iter().map(|r| r.to_string()).collect(),
                )
            })
            .collect();
        let paths = BUILTIN_LEARNING_PATHS
            .iter()
            .map(|(id, resources)| LearningPath {
                id: id.to_string(),
                resources: resources.iter().map(|r| r.to_string()).collect(),
            })
            .collect();
        Self::new(prerequisites, paths, default_goal)
    }

    pub fn from_json(raw: &str, default_goal: &str) -> Result<Self, CurriculumError> {
        let file: CurriculumFile = serde_json::from_str(raw)?;
        let mut paths = Vec::with_capacity(file.learning_paths.len());
        for (id, value) in file.learning_paths {
            let resources: Vec<String> = serde_json::from_value(value)?;
            paths.push(LearningPath { id, resources });
        }
        Ok(Self::new(file.prerequisites, paths, default_goal))
    }

    /// Uses the override file when given and readable, otherwise the built-in course.
    pub fn load_or_builtin(path: Option<&Path>, default_goal: &str) -> Self {
        let Some(path) = path else {
            return Self::builtin(default_goal);
        };
        let loaded = std::fs::read_to_string(path)
            .map_err(CurriculumError::from)
            .and_then(|raw| Self::from_json(&raw, default_goal));
        match loaded {
            Ok(curriculum) => {
                tracing::info!(
                    path = %path.display(),
                    prerequisites = curriculum.prerequisites.len(),
                    goals = curriculum.paths.len(),
                    "curriculum loaded"
                );
                curriculum
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "curriculum override unavailable, using built-in course"
                );
                Self::builtin(default_goal)
            }
        }
    }

    fn set_default_goal(&mut self, goal: &str) {
        if self.has_goal(goal) {
            self.default_goal = goal.to_string();
            return;
        }
        let fallback = self
            .paths
            .first()
            .map(|p| p.id.clone())
            .unwrap_or_default();
        if !goal.is_empty() {
            tracing::warn!(goal, fallback = %fallback, "default goal is not a known learning path");
        }
        self.default_goal = fallback;
    }

    pub fn default_goal(&self) -> &str {
        &self.default_goal
    }

    pub fn paths(&self) -> &[LearningPath] {
        &self.paths
    }

    pub fn goal_ids(&self) -> Vec<String> {
        self.paths.iter().map(|p| p.id.clone()).collect()
    }

    pub fn has_goal(&self, goal: &str) -> bool {
        self.paths.iter().any(|p| p.id == goal)
    }

    /// Maps unknown goals onto the default goal.
    pub fn resolve_goal<'a>(&'a self, goal: &'a str) -> &'a str {
        if self.has_goal(goal) {
            goal
        } else {
            &self.default_goal
        }
    }

    pub fn learning_path(&self, goal: &str) -> &[String] {
        let goal = self.resolve_goal(goal);
        self.paths
            .iter()
            .find(|p| p.id == goal)
            .map(|p| p.resources.as_slice())
            .unwrap_or(&[])
    }

    pub fn prerequisites(&self, resource: &str) -> &[String] {
        self.prerequisites
            .get(resource)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether any prerequisite entry or learning path mentions `resource`.
    pub fn is_known(&self, resource: &str) -> bool {
        self.prerequisites.contains_key(resource)
            || self
                .prerequisites
                .values()
                .any(|reqs| reqs.iter().any(|r| r == resource))
            || self
                .paths
                .iter()
                .any(|p| p.resources.iter().any(|r| r == resource))
    }

    pub fn is_available(&self, resource: &str, completed: &CompletedSet) -> bool {
        self.prerequisites(resource)
            .iter()
            .all(|req| completed.contains(req))
    }

    pub fn missing_prerequisites(&self, resource: &str, completed: &CompletedSet) -> Vec<String> {
        self.prerequisites(resource)
            .iter()
            .filter(|req| !completed.contains(*req))
            .cloned()
            .collect()
    }

    /// Returns one prerequisite cycle as `[a, b, ..., a]` if the graph has any.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            node: &'a str,
            graph: &'a HashMap<String, Vec<String>>,
            marks: &mut HashMap<&'a str, Mark>,
            stack: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            match marks.get(node) {
                Some(Mark::Done) => return None,
                Some(Mark::Visiting) => {
                    let start = stack.iter().position(|n| *n == node).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        stack[start..].iter().map(|n| n.to_string()).collect();
                    cycle.push(node.to_string());
                    return Some(cycle);
                }
                None => {}
            }
            marks.insert(node, Mark::Visiting);
            stack.push(node);
            if let Some(reqs) = graph.get(node) {
                for req in reqs {
                    if let Some(cycle) = visit(req, graph, marks, stack) {
                        return Some(cycle);
                    }
                }
            }
            stack.pop();
            marks.insert(node, Mark::Done);
            None
        }

        let mut roots: Vec<&str> = self.prerequisites.keys().map(String::as_str).collect();
        roots.sort_unstable();

        let mut marks = HashMap::new();
        let mut stack = Vec::new();
        roots
            .into_iter()
            .find_map(|root| visit(root, &self.prerequisites, &mut marks, &mut stack))
    }
}
