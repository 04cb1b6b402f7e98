//! Teas and comments.

use super::{Catalog, not_found};
use crate::error::CatalogError;
use crate::model::{Comment, NewComment, NewTea, Tea, TeaView};
use crate::patch::{CommentPatch, TeaPatch};
use crate::store::CatalogStore;
use pantry_authz::{ResourceRef, Target};
use pantry_core::{CommentId, TeaId};
use pantry_identity::{AuthenticatedUser, UserDirectory};
use serde_json::Value;
use tracing::{error, info, instrument};

impl<S: CatalogStore> Catalog<S> {
    /// Lists every tea with its owner and comments.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if storage fails.
    pub async fn list_teas(&self) -> Result<Vec<TeaView>, CatalogError> {
        let teas = self.store.list_teas().await?;
        let mut views = Vec::with_capacity(teas.len());
        for tea in teas {
            views.push(self.tea_view(tea).await?);
        }
        Ok(views)
    }

    /// Returns one tea with its owner and comments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tea does not exist.
    pub async fn get_tea(&self, id: TeaId) -> Result<TeaView, CatalogError> {
        let tea = self
            .store
            .get_tea(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::tea(id)))?;
        self.tea_view(tea).await
    }

    async fn tea_view(&self, tea: Tea) -> Result<TeaView, CatalogError> {
        let Some(owner) = self.store.find_user(tea.user_id).await? else {
            error!(tea_id = %tea.id, user_id = %tea.user_id, "tea owner is missing");
            return Err(CatalogError::Storage {
                details: format!("owner {} of tea {} is missing", tea.user_id, tea.id),
            });
        };
        let comments = self.store.comments_of(tea.id).await?;
        Ok(TeaView {
            tea,
            user: owner.summary(),
            comments,
        })
    }

    /// Creates a tea owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the name is taken.
    #[instrument(skip_all, fields(actor = %actor.user_id(), name = %new.name))]
    pub async fn create_tea(
        &self,
        actor: &AuthenticatedUser,
        new: NewTea,
    ) -> Result<Tea, CatalogError> {
        let tea = Tea::new(new, actor.user_id());
        self.store.insert_tea(&tea).await?;
        info!(tea_id = %tea.id, "created tea");
        Ok(tea)
    }

    /// Applies a partial update to a tea owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Forbidden`, `Validation` or `Conflict`, checked in
    /// that order.
    #[instrument(skip_all, fields(actor = %actor.user_id(), tea_id = %id))]
    pub async fn update_tea(
        &self,
        actor: &AuthenticatedUser,
        id: TeaId,
        patch: &Value,
    ) -> Result<Tea, CatalogError> {
        self.authorize(actor, ResourceRef::tea(id).into()).await?;
        let patch = TeaPatch::from_json(patch)?;

        let mut tea = self
            .store
            .get_tea(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::tea(id)))?;
        patch.apply(&mut tea);
        if !self.store.update_tea(&tea).await? {
            return Err(not_found(ResourceRef::tea(id)));
        }
        Ok(tea)
    }

    /// Deletes a tea owned by `actor` along with its comments.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Forbidden`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), tea_id = %id))]
    pub async fn delete_tea(
        &self,
        actor: &AuthenticatedUser,
        id: TeaId,
    ) -> Result<(), CatalogError> {
        self.authorize(actor, ResourceRef::tea(id).into()).await?;
        if !self.store.delete_tea(id).await? {
            return Err(not_found(ResourceRef::tea(id)));
        }
        info!("deleted tea");
        Ok(())
    }

    /// Lists every comment on every tea.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if storage fails.
    pub async fn list_comments(&self) -> Result<Vec<Comment>, CatalogError> {
        Ok(self.store.list_comments().await?)
    }

    /// Returns one comment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the comment does not exist.
    pub async fn get_comment(&self, id: CommentId) -> Result<Comment, CatalogError> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| not_found(ResourceRef::comment(id)))
    }

    /// Adds a comment to a tea owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the tea does not exist and `Forbidden` if it
    /// belongs to someone else.
    #[instrument(skip_all, fields(actor = %actor.user_id(), tea_id = %new.tea_id))]
    pub async fn create_comment(
        &self,
        actor: &AuthenticatedUser,
        new: NewComment,
    ) -> Result<Comment, CatalogError> {
        self.authorize(actor, Target::new_comment(new.tea_id)).await?;
        let comment = Comment::new(new);
        self.store.insert_comment(&comment).await?;
        info!(comment_id = %comment.id, "created comment");
        Ok(comment)
    }

    /// Applies a partial update to a comment on a tea owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault`, `Forbidden` or `Validation`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), comment_id = %id))]
    pub async fn update_comment(
        &self,
        actor: &AuthenticatedUser,
        id: CommentId,
        patch: &Value,
    ) -> Result<Comment, CatalogError> {
        self.authorize(actor, ResourceRef::comment(id).into()).await?;
        let patch = CommentPatch::from_json(patch)?;

        let mut comment = self.get_comment(id).await?;
        patch.apply(&mut comment);
        if !self.store.update_comment(&comment).await? {
            return Err(not_found(ResourceRef::comment(id)));
        }
        Ok(comment)
    }

    /// Deletes a comment on a tea owned by `actor`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `IntegrityFault` or `Forbidden`.
    #[instrument(skip_all, fields(actor = %actor.user_id(), comment_id = %id))]
    pub async fn delete_comment(
        &self,
        actor: &AuthenticatedUser,
        id: CommentId,
    ) -> Result<(), CatalogError> {
        self.authorize(actor, ResourceRef::comment(id).into()).await?;
        if !self.store.delete_comment(id).await? {
            return Err(not_found(ResourceRef::comment(id)));
        }
        info!("deleted comment");
        Ok(())
    }
}
