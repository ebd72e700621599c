use chrono::NaiveDate;
use tracing::info;

use super::{next_record_id, SchoolService, SchoolServiceError};
use crate::school::access::Caller;
use crate::school::domain::{
    Announcement, AnnouncementForm, AnnouncementId, AnnouncementUpdate, Event, EventForm, EventId,
    EventUpdate,
};
use crate::school::repository::RepositoryError;
use crate::school::storage::{event_photo_path, Bucket, ObjectStore, Upload};
use crate::school::RecordStore;

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    /// Every event, earliest date first.
    pub fn list_events(&self) -> Result<Vec<Event>, SchoolServiceError> {
        let mut events = self.store.all_events()?;
        events.sort_by(|a, b| (a.event_date, &a.id).cmp(&(b.event_date, &b.id)));
        Ok(events)
    }

    /// Events dated today or later, soonest first.
    pub fn upcoming_events(
        &self,
        today: NaiveDate,
        limit: usize,
    ) -> Result<Vec<Event>, SchoolServiceError> {
        Ok(self
            .list_events()?
            .into_iter()
            .filter(|event| event.is_upcoming(today))
            .take(limit)
            .collect())
    }

    /// Events before today, most recent first.
    pub fn past_events(&self, today: NaiveDate) -> Result<Vec<Event>, SchoolServiceError> {
        let mut past: Vec<Event> = self
            .list_events()?
            .into_iter()
            .filter(|event| !event.is_upcoming(today))
            .collect();
        past.reverse();
        Ok(past)
    }

    /// Create an event, uploading its photos first. Any failed upload aborts the create.
    pub fn create_event(
        &self,
        caller: &Caller,
        form: EventForm,
        photos: Vec<Upload>,
    ) -> Result<Event, SchoolServiceError> {
        caller.require_admin("creating an event")?;
        if form.title.trim().is_empty() {
            return Err(SchoolServiceError::Invalid(
                "event title is required".to_string(),
            ));
        }

        let now = self.now();
        let millis = self.upload_stamp();
        let photo_urls = photos
            .into_iter()
            .enumerate()
            .map(|(index, upload)| {
                let path = event_photo_path(&caller.user_id, millis, index, &upload.file_name);
                let stored = self.objects.upload(Bucket::EventPhotos, &path, upload)?;
                Ok(self.objects.url(stored.bucket, &stored.path)?)
            })
            .collect::<Result<Vec<String>, SchoolServiceError>>()?;

        let event = self.store.insert_event(Event {
            id: EventId(next_record_id("evt")),
            title: form.title,
            description: form.description,
            event_date: form.event_date,
            photos: photo_urls,
            created_by: caller.user_id.clone(),
            created_at: now,
            updated_at: now,
        })?;

        info!(event = %event.id, date = %event.event_date, photos = event.photos.len(), "event created");
        Ok(event)
    }

    /// Upload one more photo for an existing event.
    pub fn add_event_photo(
        &self,
        caller: &Caller,
        event_id: &EventId,
        upload: Upload,
    ) -> Result<Event, SchoolServiceError> {
        caller.require_admin("adding an event photo")?;
        let mut event = self
            .store
            .fetch_event(event_id)?
            .ok_or_else(|| SchoolServiceError::not_found("event", event_id))?;

        let now = self.now();
        let path = event_photo_path(
            &caller.user_id,
            self.upload_stamp(),
            event.photos.len(),
            &upload.file_name,
        );
        let stored = self.objects.upload(Bucket::EventPhotos, &path, upload)?;
        event.photos.push(self.objects.url(stored.bucket, &stored.path)?);
        event.updated_at = now;
        self.store.update_event(event.clone())?;
        Ok(event)
    }

    pub fn update_event(
        &self,
        caller: &Caller,
        event_id: &EventId,
        update: EventUpdate,
    ) -> Result<Event, SchoolServiceError> {
        caller.require_admin("editing an event")?;
        let mut event = self
            .store
            .fetch_event(event_id)?
            .ok_or_else(|| SchoolServiceError::not_found("event", event_id))?;

        if let Some(title) = update.title {
            event.title = title;
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(event_date) = update.event_date {
            event.event_date = event_date;
        }
        if let Some(photos) = update.photos {
            event.photos = photos;
        }
        event.updated_at = self.now();
        self.store.update_event(event.clone())?;
        Ok(event)
    }

    pub fn delete_event(&self, caller: &Caller, event_id: &EventId) -> Result<(), SchoolServiceError> {
        caller.require_admin("deleting an event")?;
        match self.store.delete_event(event_id) {
            Ok(()) => {
                info!(event = %event_id, "event deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(SchoolServiceError::not_found("event", event_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Announcements by priority (high first), then newest date.
    pub fn list_announcements(&self) -> Result<Vec<Announcement>, SchoolServiceError> {
        let mut announcements = self.store.all_announcements()?;
        announcements.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then_with(|| b.announcement_date.cmp(&a.announcement_date))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(announcements)
    }

    pub fn recent_announcements(
        &self,
        limit: usize,
    ) -> Result<Vec<Announcement>, SchoolServiceError> {
        let mut announcements = self.list_announcements()?;
        announcements.truncate(limit);
        Ok(announcements)
    }

    pub fn create_announcement(
        &self,
        caller: &Caller,
        form: AnnouncementForm,
    ) -> Result<Announcement, SchoolServiceError> {
        caller.require_admin("publishing an announcement")?;
        if form.title.trim().is_empty() {
            return Err(SchoolServiceError::Invalid(
                "announcement title is required".to_string(),
            ));
        }

        let now = self.now();
        let announcement = self.store.insert_announcement(Announcement {
            id: AnnouncementId(next_record_id("ann")),
            title: form.title,
            content: form.content,
            priority: form.priority,
            announcement_date: form.announcement_date,
            created_by: caller.user_id.clone(),
            created_at: now,
            updated_at: now,
        })?;

        info!(announcement = %announcement.id, priority = ?announcement.priority, "announcement published");
        Ok(announcement)
    }

    pub fn update_announcement(
        &self,
        caller: &Caller,
        announcement_id: &AnnouncementId,
        update: AnnouncementUpdate,
    ) -> Result<Announcement, SchoolServiceError> {
        caller.require_admin("editing an announcement")?;
        let mut announcement = self
            .store
            .fetch_announcement(announcement_id)?
            .ok_or_else(|| SchoolServiceError::not_found("announcement", announcement_id))?;

        if let Some(title) = update.title {
            announcement.title = title;
        }
        if let Some(content) = update.content {
            announcement.content = content;
        }
        if let Some(priority) = update.priority {
            announcement.priority = priority;
        }
        if let Some(date) = update.announcement_date {
            announcement.announcement_date = date;
        }
        announcement.updated_at = self.now();
        self.store.update_announcement(announcement.clone())?;
        Ok(announcement)
    }

    pub fn delete_announcement(
        &self,
        caller: &Caller,
        announcement_id: &AnnouncementId,
    ) -> Result<(), SchoolServiceError> {
        caller.require_admin("deleting an announcement")?;
        match self.store.delete_announcement(announcement_id) {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(SchoolServiceError::not_found(
                "announcement",
                announcement_id,
            )),
            Err(err) => Err(err.into()),
        }
    }
}
