//! Transizioni della macchina a stati inviti/richieste
//!
//! Stati per coppia (viaggio, utente):
//!
//! ```text
//! NONE --invite(host)--> PENDING(invitation) --accept--> ACCEPTED --leave--> NONE
//!                                             \--reject--> NONE
//! NONE --request_join(self, public)--> PENDING(request) --accept(host)--> ACCEPTED
//!                                                         \--reject(host)--> NONE
//! ACCEPTED --change_role(host)--> ACCEPTED (ruolo cambiato)
//! ```
//!
//! Ogni transizione controlla tutte le precondizioni prima di toccare la lista membri:
//! se ritorna `Err` il documento non è stato modificato.

use super::MembershipError;
use super::access::{is_host, require_host};
use crate::entities::{
    Decision, Member, MemberOrigin, MemberRole, MemberStatus, Trip,
};

impl Trip {
    fn position_of(&self, user_id: i32) -> Option<usize> {
        self.members.iter().position(|m| m.user_id == user_id)
    }

    /// Record pending con l'origine richiesta, usato dalle due risposte
    fn pending_position(
        &self,
        user_id: i32,
        origin: MemberOrigin,
        missing: &'static str,
        processed: &'static str,
    ) -> Result<usize, MembershipError> {
        let idx = self
            .members
            .iter()
            .position(|m| m.user_id == user_id && m.origin == origin)
            .ok_or(MembershipError::NotFound(missing))?;

        if self.members[idx].status != MemberStatus::Pending {
            return Err(MembershipError::Conflict(processed));
        }
        Ok(idx)
    }

    fn apply_decision(&mut self, idx: usize, decision: Decision) {
        match decision {
            Decision::Accept => self.members[idx].status = MemberStatus::Accepted,
            Decision::Reject => {
                self.members.remove(idx);
            }
        }
    }

    /// L'host invita `target`: nuovo record viewer/pending
    pub fn invite(&mut self, actor: i32, target: i32) -> Result<(), MembershipError> {
        require_host(self, actor, "Only the host can invite members")?;

        if self.member(target).is_some() {
            return Err(MembershipError::Conflict("User already invited or a member"));
        }

        self.members.push(Member {
            user_id: target,
            role: MemberRole::Viewer,
            status: MemberStatus::Pending,
            origin: MemberOrigin::Invitation,
        });
        Ok(())
    }

    /// Richiesta di ingresso in un viaggio pubblico
    pub fn request_join(&mut self, actor: i32) -> Result<(), MembershipError> {
        if !self.is_public {
            return Err(MembershipError::Forbidden("This trip is private"));
        }

        if self.member(actor).is_some() {
            return Err(MembershipError::Conflict(
                "You already requested to join or are a member",
            ));
        }

        self.members.push(Member {
            user_id: actor,
            role: MemberRole::Viewer,
            status: MemberStatus::Pending,
            origin: MemberOrigin::Request,
        });
        Ok(())
    }

    /// Risposta dell'invitato al proprio invito
    pub fn respond_to_invitation(
        &mut self,
        actor: i32,
        decision: Decision,
    ) -> Result<(), MembershipError> {
        let idx = self.pending_position(
            actor,
            MemberOrigin::Invitation,
            "No invitation found for this user",
            "Invitation already responded to",
        )?;
        self.apply_decision(idx, decision);
        Ok(())
    }

    /// Risposta dell'host ad una richiesta di ingresso di `target`
    pub fn respond_to_request(
        &mut self,
        actor: i32,
        target: i32,
        decision: Decision,
    ) -> Result<(), MembershipError> {
        require_host(self, actor, "Only the host can answer join requests")?;

        let idx = self.pending_position(
            target,
            MemberOrigin::Request,
            "No join request found for this user",
            "Join request already responded to",
        )?;
        self.apply_decision(idx, decision);
        Ok(())
    }

    /// Uscita volontaria di un membro accettato. L'host non può uscire, deve eliminare il viaggio.
    pub fn leave(&mut self, actor: i32) -> Result<(), MembershipError> {
        if is_host(self, actor) {
            return Err(MembershipError::Forbidden(
                "The host cannot leave the trip, delete it instead",
            ));
        }

        let idx = self
            .position_of(actor)
            .ok_or(MembershipError::NotFound("You are not a member of this trip"))?;

        if self.members[idx].status != MemberStatus::Accepted {
            return Err(MembershipError::Conflict(
                "You are not an active member of this trip",
            ));
        }

        self.members.remove(idx);
        Ok(())
    }

    /// Cambio ruolo viewer <-> editor di un membro accettato
    pub fn change_role(
        &mut self,
        actor: i32,
        target: i32,
        new_role: &str,
    ) -> Result<(), MembershipError> {
        require_host(self, actor, "Only the host can change member roles")?;

        let role = MemberRole::assignable(new_role).ok_or(MembershipError::BadRequest(
            "Role must be 'viewer' or 'editor'",
        ))?;

        if is_host(self, target) {
            return Err(MembershipError::BadRequest("The host role cannot be changed"));
        }

        let idx = self
            .position_of(target)
            .ok_or(MembershipError::NotFound("User is not a member of this trip"))?;

        if self.members[idx].status != MemberStatus::Accepted {
            return Err(MembershipError::Conflict(
                "Only accepted members can change role",
            ));
        }

        self.members[idx].role = role;
        Ok(())
    }
}
