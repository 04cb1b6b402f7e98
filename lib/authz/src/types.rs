//! Resource references used by the ownership model.

use pantry_core::{CommentId, IngredientId, RecipeId, StepId, TeaId};
use std::fmt;

/// Kinds of catalog resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A recipe, owned directly by a user.
    Recipe,
    /// A tea, owned directly by a user.
    Tea,
    /// A step of a recipe.
    Step,
    /// An ingredient line of a recipe.
    Ingredient,
    /// A comment on a tea.
    Comment,
}

impl ResourceKind {
    /// Returns the lowercase resource name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recipe => "recipe",
            Self::Tea => "tea",
            Self::Step => "step",
            Self::Ingredient => "ingredient",
            Self::Comment => "comment",
        }
    }

    /// Returns true for resources that reference their owning user directly.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.parent_kind().is_none()
    }

    /// Returns the kind of the parent resource, or `None` for top-level kinds.
    #[must_use]
    pub fn parent_kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Recipe | Self::Tea => None,
            Self::Step | Self::Ingredient => Some(Self::Recipe),
            Self::Comment => Some(Self::Tea),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resource that carries its owner's user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopLevelRef {
    /// A recipe.
    Recipe(RecipeId),
    /// A tea.
    Tea(TeaId),
}

impl TopLevelRef {
    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Recipe(_) => ResourceKind::Recipe,
            Self::Tea(_) => ResourceKind::Tea,
        }
    }
}

impl fmt::Display for TopLevelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe(id) => write!(f, "recipe:{id}"),
            Self::Tea(id) => write!(f, "tea:{id}"),
        }
    }
}

/// A resource owned only through its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildRef {
    /// A recipe step.
    Step(StepId),
    /// A recipe ingredient.
    Ingredient(IngredientId),
    /// A tea comment.
    Comment(CommentId),
}

impl ChildRef {
    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Step(_) => ResourceKind::Step,
            Self::Ingredient(_) => ResourceKind::Ingredient,
            Self::Comment(_) => ResourceKind::Comment,
        }
    }
}

impl fmt::Display for ChildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step(id) => write!(f, "step:{id}"),
            Self::Ingredient(id) => write!(f, "ingredient:{id}"),
            Self::Comment(id) => write!(f, "comment:{id}"),
        }
    }
}

/// Any catalog resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    /// A resource with a direct owner.
    TopLevel(TopLevelRef),
    /// A resource owned through its parent.
    Child(ChildRef),
}

impl ResourceRef {
    /// Creates a recipe reference.
    #[must_use]
    pub fn recipe(id: RecipeId) -> Self {
        Self::TopLevel(TopLevelRef::Recipe(id))
    }

    /// Creates a tea reference.
    #[must_use]
    pub fn tea(id: TeaId) -> Self {
        Self::TopLevel(TopLevelRef::Tea(id))
    }

    /// Creates a step reference.
    #[must_use]
    pub fn step(id: StepId) -> Self {
        Self::Child(ChildRef::Step(id))
    }

    /// Creates an ingredient reference.
    #[must_use]
    pub fn ingredient(id: IngredientId) -> Self {
        Self::Child(ChildRef::Ingredient(id))
    }

    /// Creates a comment reference.
    #[must_use]
    pub fn comment(id: CommentId) -> Self {
        Self::Child(ChildRef::Comment(id))
    }

    /// Returns the resource kind.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::TopLevel(r) => r.kind(),
            Self::Child(r) => r.kind(),
        }
    }
}

impl From<TopLevelRef> for ResourceRef {
    fn from(r: TopLevelRef) -> Self {
        Self::TopLevel(r)
    }
}

impl From<ChildRef> for ResourceRef {
    fn from(r: ChildRef) -> Self {
        Self::Child(r)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TopLevel(r) => fmt::Display::fmt(r, f),
            Self::Child(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// What a mutating operation acts on.
///
/// Updates and deletes act on a resource that already exists. Creating a
/// child acts on nothing that can be looked up yet, so the parent named in
/// the request is checked instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// An existing resource being updated or deleted.
    Existing(ResourceRef),
    /// A child about to be created under `parent`.
    NewChild {
        /// The kind of child being created.
        kind: ResourceKind,
        /// The parent named in the creation payload.
        parent: TopLevelRef,
    },
}

impl Target {
    /// A new step under a recipe.
    #[must_use]
    pub fn new_step(recipe_id: RecipeId) -> Self {
        Self::NewChild {
            kind: ResourceKind::Step,
            parent: TopLevelRef::Recipe(recipe_id),
        }
    }

    /// A new ingredient under a recipe.
    #[must_use]
    pub fn new_ingredient(recipe_id: RecipeId) -> Self {
        Self::NewChild {
            kind: ResourceKind::Ingredient,
            parent: TopLevelRef::Recipe(recipe_id),
        }
    }

    /// A new comment under a tea.
    #[must_use]
    pub fn new_comment(tea_id: TeaId) -> Self {
        Self::NewChild {
            kind: ResourceKind::Comment,
            parent: TopLevelRef::Tea(tea_id),
        }
    }
}

impl From<ResourceRef> for Target {
    fn from(r: ResourceRef) -> Self {
        Self::Existing(r)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Existing(r) => fmt::Display::fmt(r, f),
            Self::NewChild { kind, parent } => write!(f, "new {kind} under {parent}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_kinds_have_no_parent() {
        assert!(ResourceKind::Recipe.is_top_level());
        assert!(ResourceKind::Tea.is_top_level());
        assert!(!ResourceKind::Step.is_top_level());
    }

    #[test]
    fn child_kinds_point_at_their_parent_kind() {
        assert_eq!(ResourceKind::Step.parent_kind(), Some(ResourceKind::Recipe));
        assert_eq!(
            ResourceKind::Ingredient.parent_kind(),
            Some(ResourceKind::Recipe)
        );
        assert_eq!(ResourceKind::Comment.parent_kind(), Some(ResourceKind::Tea));
    }

    #[test]
    fn resource_display_includes_kind_and_id() {
        let id = StepId::new();
        let display = ResourceRef::step(id).to_string();
        assert_eq!(display, format!("step:{id}"));
    }

    #[test]
    fn new_child_targets_name_their_parent() {
        let recipe_id = RecipeId::new();
        let target = Target::new_ingredient(recipe_id);
        assert_eq!(
            target,
            Target::NewChild {
                kind: ResourceKind::Ingredient,
                parent: TopLevelRef::Recipe(recipe_id),
            }
        );
        assert!(target.to_string().starts_with("new ingredient under recipe:"));
    }
}
