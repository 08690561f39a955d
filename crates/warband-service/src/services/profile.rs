//! Profile service
//!
//! Handles player profiles, their characters, and the login-time membership
//! refresh against each guild's cached external roster snapshot.

use tracing::{info, instrument};
use validator::Validate;

use warband_core::entities::{Character, GuildMember, Profile};
use warband_core::error::DomainError;
use warband_core::value_objects::{AvailabilityMap, Snowflake};

use crate::dto::{
    CharacterResponse, CreateCharacterRequest, CreateProfileRequest, ProfileResponse,
    UpdateCharacterRequest, UpdateProfileRequest,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Profile service
pub struct ProfileService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ProfileService<'a> {
    /// Create a new ProfileService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a new profile
    #[instrument(skip(self, request))]
    pub async fn create_profile(
        &self,
        request: CreateProfileRequest,
    ) -> ServiceResult<ProfileResponse> {
        request.validate()?;

        if self
            .ctx
            .profile_repo()
            .find_by_family_name(&request.family_name)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict(format!(
                "Family name already taken: {}",
                request.family_name
            )));
        }

        let profile = Profile {
            id: self.ctx.generate_id(),
            family_name: request.family_name,
            external_id: request.external_id,
            availability: AvailabilityMap::new(),
            auto_sign_up: false,
        };
        self.ctx.profile_repo().create(&profile).await?;

        info!(profile_id = %profile.id, "Profile created");

        Ok(ProfileResponse::from(&profile))
    }

    /// Get profile by ID
    #[instrument(skip(self))]
    pub async fn get_profile(&self, profile_id: Snowflake) -> ServiceResult<ProfileResponse> {
        let profile = self.load_profile(profile_id).await?;
        Ok(ProfileResponse::from(&profile))
    }

    /// Update availability and auto sign-up settings
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        profile_id: Snowflake,
        request: UpdateProfileRequest,
    ) -> ServiceResult<ProfileResponse> {
        let mut profile = self.load_profile(profile_id).await?;

        if let Some(availability) = request.availability {
            profile.availability = AvailabilityMap::from_day_map(&availability);
        }
        if let Some(auto_sign_up) = request.auto_sign_up {
            profile.auto_sign_up = auto_sign_up;
        }

        self.ctx.profile_repo().update(&profile).await?;

        Ok(ProfileResponse::from(&profile))
    }

    /// List a profile's characters
    #[instrument(skip(self))]
    pub async fn list_characters(
        &self,
        profile_id: Snowflake,
    ) -> ServiceResult<Vec<CharacterResponse>> {
        let characters = self.ctx.character_repo().find_by_profile(profile_id).await?;
        Ok(characters.iter().map(CharacterResponse::from).collect())
    }

    /// Create a character; a profile's first character becomes its main
    #[instrument(skip(self, request))]
    pub async fn create_character(
        &self,
        profile_id: Snowflake,
        request: CreateCharacterRequest,
    ) -> ServiceResult<CharacterResponse> {
        request.validate()?;
        self.load_profile(profile_id).await?;

        let existing = self.ctx.character_repo().find_by_profile(profile_id).await?;

        let character = Character {
            id: self.ctx.generate_id(),
            profile_id,
            name: request.name,
            class_name: request.class_name,
            level: request.level,
            is_main: existing.is_empty(),
        };
        self.ctx.character_repo().create(&character).await?;

        info!(profile_id = %profile_id, character_id = %character.id, "Character created");

        Ok(CharacterResponse::from(&character))
    }

    /// Update a character owned by the profile
    #[instrument(skip(self, request))]
    pub async fn update_character(
        &self,
        profile_id: Snowflake,
        character_id: Snowflake,
        request: UpdateCharacterRequest,
    ) -> ServiceResult<CharacterResponse> {
        request.validate()?;
        let mut character = self.load_character(character_id).await?;
        if !character.belongs_to(profile_id) {
            return Err(DomainError::CharacterNotOwned.into());
        }

        if let Some(name) = request.name {
            character.name = name;
        }
        if let Some(class_name) = request.class_name {
            character.class_name = class_name;
        }
        if let Some(level) = request.level {
            character.level = level;
        }
        if let Some(is_main) = request.is_main {
            // Demoting the main directly is not allowed; promote another
            // character instead so exactly one main remains
            if !is_main && character.is_main {
                return Err(ServiceError::validation(
                    "Promote another character to change the main",
                ));
            }
            character.is_main = is_main;
        }

        // The repository clears the previous main when is_main is set
        self.ctx.character_repo().update(&character).await?;

        Ok(CharacterResponse::from(&character))
    }

    /// Delete a character owned by the profile
    #[instrument(skip(self))]
    pub async fn delete_character(
        &self,
        profile_id: Snowflake,
        character_id: Snowflake,
    ) -> ServiceResult<()> {
        let character = self.load_character(character_id).await?;
        if !character.belongs_to(profile_id) {
            return Err(DomainError::CharacterNotOwned.into());
        }

        self.ctx.character_repo().delete(character_id).await?;

        info!(profile_id = %profile_id, character_id = %character_id, "Character deleted");

        Ok(())
    }

    /// Refresh the profile's guild memberships from each integrated guild's
    /// cached roster snapshot.
    ///
    /// This is the cheap login-time path: it consults the member cache
    /// written by the last full roster sync instead of hitting the external
    /// source. Removals are left to the full sync. Returns the number of
    /// memberships created or re-ranked.
    #[instrument(skip(self))]
    pub async fn refresh_guilds(&self, profile_id: Snowflake) -> ServiceResult<usize> {
        let Some(profile) = self.ctx.profile_repo().find_by_id(profile_id).await? else {
            return Ok(0);
        };
        let Some(external_id) = profile.external_id.as_deref() else {
            return Ok(0);
        };

        let guilds = self.ctx.guild_repo().find_integrated().await?;
        let mut changed = 0;

        for guild in &guilds {
            let Some(&role_id) = guild.integration.member_cache.get(external_id) else {
                continue;
            };

            match self.ctx.member_repo().find(guild.id, profile_id).await? {
                Some(member) if member.role_id == role_id => {}
                Some(_) => {
                    self.ctx
                        .member_repo()
                        .update_role(guild.id, profile_id, role_id)
                        .await?;
                    changed += 1;
                }
                None => {
                    let member = GuildMember::new(guild.id, profile_id, role_id);
                    self.ctx.member_repo().create(&member).await?;
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            info!(profile_id = %profile_id, changed, "Memberships refreshed from cache");
        }

        Ok(changed)
    }

    async fn load_profile(&self, profile_id: Snowflake) -> ServiceResult<Profile> {
        self.ctx
            .profile_repo()
            .find_by_id(profile_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile", profile_id.to_string()))
    }

    async fn load_character(&self, character_id: Snowflake) -> ServiceResult<Character> {
        self.ctx
            .character_repo()
            .find_by_id(character_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Character", character_id.to_string()))
    }
}
