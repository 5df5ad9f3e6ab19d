//! Test case tree - hierarchical contexts with inherited setup/teardown
//!
//! Test cases live in an arena owned by a [`Registry`]. Every node keeps a
//! parent link, so the effective setup chain (outer to inner) and teardown
//! chain (inner to outer) are found by walking up the tree at execution time.
//!
//! ```
//! use verity_runtime::Registry;
//!
//! let mut registry = Registry::new();
//! registry.context("A user", |c| {
//!     c.setup(|ctx| {
//!         ctx.insert("name", "alice".to_string());
//!         Ok(())
//!     });
//!
//!     c.test("has a name", |ctx| {
//!         let name = ctx.get::<String>("name").cloned();
//!         ctx.assert_equal(Some("alice".to_string()), name)
//!     });
//!
//!     c.context("when deleted", |c| {
//!         c.pending("is gone");
//!     });
//! });
//!
//! let described: Vec<_> = registry.test_cases().map(|t| t.description()).collect();
//! assert_eq!(described, ["A user", "A user when deleted"]);
//! ```

use crate::context::Context;
use crate::location::Location;
use crate::signal::TestResult;
use std::fmt;
use std::ops::Index;

/// A setup, teardown or test block
pub type Block = Box<dyn Fn(&mut Context<'_>) -> TestResult>;

/// Index of a test case inside its [`Registry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestCaseId(usize);

impl TestCaseId {
    /// Position in the registry arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single named test declared inside a test case
pub struct Test {
    name: String,
    location: Location,
    test_case: TestCaseId,
    action: Option<Block>,
}

impl Test {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Test case the test was declared in
    pub fn test_case(&self) -> TestCaseId {
        self.test_case
    }

    /// The test body; `None` means the test is pending
    pub fn action(&self) -> Option<&Block> {
        self.action.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.action.is_none()
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("test_case", &self.test_case)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// A node of the test case tree
pub struct TestCase {
    id: TestCaseId,
    parent: Option<TestCaseId>,
    children: Vec<TestCaseId>,
    own_description: String,
    description: String,
    location: Option<Location>,
    tests: Vec<Test>,
    setup: Vec<Block>,
    teardown: Vec<Block>,
}

impl TestCase {
    fn root() -> Self {
        Self {
            id: TestCaseId(0),
            parent: None,
            children: Vec::new(),
            own_description: String::new(),
            description: String::new(),
            location: None,
            tests: Vec::new(),
            setup: Vec::new(),
            teardown: Vec::new(),
        }
    }

    pub fn id(&self) -> TestCaseId {
        self.id
    }

    pub fn parent(&self) -> Option<TestCaseId> {
        self.parent
    }

    /// Nested contexts, in definition order
    pub fn children(&self) -> &[TestCaseId] {
        &self.children
    }

    /// Resolved description: the ancestors' descriptions followed by this one
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The description passed to `context`, without ancestors
    pub fn own_description(&self) -> &str {
        &self.own_description
    }

    /// Where the context was declared; `None` only for the root
    pub fn location(&self) -> Option<Location> {
        self.location
    }

    /// Tests in definition order
    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("location", &self.location)
            .field("tests", &self.tests)
            .field("children", &self.children)
            .finish()
    }
}

/// Append-only arena of test cases, in definition order
pub struct Registry {
    nodes: Vec<TestCase>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// The implicit root every top-level context hangs from
    pub const ROOT: TestCaseId = TestCaseId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![TestCase::root()],
        }
    }

    /// Define a top-level context, declared at the caller's location
    #[track_caller]
    pub fn context<F>(&mut self, description: impl Into<String>, body: F) -> TestCaseId
    where
        F: FnOnce(&mut Definition<'_>),
    {
        self.context_at(Location::caller(), description, body)
    }

    /// Define a top-level context declared at an explicit location
    pub fn context_at<F>(
        &mut self,
        location: Location,
        description: impl Into<String>,
        body: F,
    ) -> TestCaseId
    where
        F: FnOnce(&mut Definition<'_>),
    {
        self.define_context(Self::ROOT, location, description.into(), body)
    }

    fn define_context<F>(
        &mut self,
        parent: TestCaseId,
        location: Location,
        description: String,
        body: F,
    ) -> TestCaseId
    where
        F: FnOnce(&mut Definition<'_>),
    {
        let id = TestCaseId(self.nodes.len());
        let resolved = resolve_description(&self[parent].description, &description);
        tracing::trace!(description = %resolved, %location, "defining test case");

        self.nodes.push(TestCase {
            id,
            parent: Some(parent),
            children: Vec::new(),
            own_description: description,
            description: resolved,
            location: Some(location),
            tests: Vec::new(),
            setup: Vec::new(),
            teardown: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);

        let mut definition = Definition { registry: self, id };
        body(&mut definition);
        id
    }

    /// Look up a test case
    pub fn get(&self, id: TestCaseId) -> Option<&TestCase> {
        self.nodes.get(id.0)
    }

    /// Every defined test case in definition order, root excluded
    pub fn test_cases(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.nodes.iter().skip(1)
    }

    /// Ids of every defined test case in definition order, root excluded
    pub fn ids(&self) -> Vec<TestCaseId> {
        self.test_cases().map(TestCase::id).collect()
    }

    /// Number of defined test cases, root excluded
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` sits strictly below `ancestor` in the tree
    pub fn is_descendant(&self, id: TestCaseId, ancestor: TestCaseId) -> bool {
        let mut current = self[id].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self[parent].parent;
        }
        false
    }

    /// Path from the root down to `id`, both included
    fn lineage(&self, id: TestCaseId) -> Vec<TestCaseId> {
        let mut path = vec![id];
        let mut current = self[id].parent;
        while let Some(parent) = current {
            path.push(parent);
            current = self[parent].parent;
        }
        path.reverse();
        path
    }

    /// Effective setup of `id`: ancestors first, own blocks last
    pub fn setup_chain(&self, id: TestCaseId) -> Vec<&Block> {
        self.lineage(id)
            .into_iter()
            .flat_map(|node| self[node].setup.iter())
            .collect()
    }

    /// Effective teardown of `id`: own blocks first, then the ancestors'
    pub fn teardown_chain(&self, id: TestCaseId) -> Vec<&Block> {
        self.lineage(id)
            .into_iter()
            .rev()
            .flat_map(|node| self[node].teardown.iter())
            .collect()
    }
}

impl Index<TestCaseId> for Registry {
    type Output = TestCase;

    fn index(&self, id: TestCaseId) -> &TestCase {
        &self.nodes[id.0]
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.test_cases()).finish()
    }
}

fn resolve_description(parent: &str, own: &str) -> String {
    format!("{} {}", parent, own).trim().to_string()
}

/// Handle passed to a context body to declare its contents
pub struct Definition<'r> {
    registry: &'r mut Registry,
    id: TestCaseId,
}

impl Definition<'_> {
    /// The test case being defined
    pub fn id(&self) -> TestCaseId {
        self.id
    }

    /// Resolved description of the test case being defined
    pub fn description(&self) -> &str {
        &self.registry[self.id].description
    }

    /// Declare a test
    #[track_caller]
    pub fn test<F>(&mut self, name: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> TestResult + 'static,
    {
        self.test_at(Location::caller(), name, action)
    }

    /// Declare a test at an explicit location
    pub fn test_at<F>(&mut self, location: Location, name: impl Into<String>, action: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> TestResult + 'static,
    {
        self.push_test(location, name.into(), Some(Box::new(action)))
    }

    /// Declare a test without a body; it always reports as pending
    #[track_caller]
    pub fn pending(&mut self, name: impl Into<String>) -> &mut Self {
        self.pending_at(Location::caller(), name)
    }

    /// Declare a pending test at an explicit location
    pub fn pending_at(&mut self, location: Location, name: impl Into<String>) -> &mut Self {
        self.push_test(location, name.into(), None)
    }

    fn push_test(&mut self, location: Location, name: String, action: Option<Block>) -> &mut Self {
        let test_case = self.id;
        self.registry.nodes[test_case.0].tests.push(Test {
            name,
            location,
            test_case,
            action,
        });
        self
    }

    /// Add a block run before every test of this context and its descendants.
    /// Repeated calls run in call order.
    pub fn setup<F>(&mut self, block: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> TestResult + 'static,
    {
        self.registry.nodes[self.id.0].setup.push(Box::new(block));
        self
    }

    /// Add a block run after every test of this context and its descendants.
    /// Repeated calls run in call order.
    pub fn teardown<F>(&mut self, block: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>) -> TestResult + 'static,
    {
        self.registry.nodes[self.id.0].teardown.push(Box::new(block));
        self
    }

    /// Declare a nested context inheriting this one's setup and teardown
    #[track_caller]
    pub fn context<F>(&mut self, description: impl Into<String>, body: F) -> TestCaseId
    where
        F: FnOnce(&mut Definition<'_>),
    {
        self.context_at(Location::caller(), description, body)
    }

    /// Declare a nested context at an explicit location
    pub fn context_at<F>(
        &mut self,
        location: Location,
        description: impl Into<String>,
        body: F,
    ) -> TestCaseId
    where
        F: FnOnce(&mut Definition<'_>),
    {
        self.registry
            .define_context(self.id, location, description.into(), body)
    }
}
