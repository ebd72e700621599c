use tracing::{info, warn};

use super::{newest_first, next_record_id, SchoolService, SchoolServiceError};
use crate::school::access::Caller;
use crate::school::domain::{HelpQuery, QueryForm, QueryId};
use crate::school::lifecycle::QueryStatus;
use crate::school::storage::{attachment_path, Bucket, ObjectStore, Upload};
use crate::school::views::{join_queries, QueryWithParent};
use crate::school::RecordStore;

impl<S, O> SchoolService<S, O>
where
    S: RecordStore + 'static,
    O: ObjectStore + 'static,
{
    pub fn submit_query(
        &self,
        caller: &Caller,
        form: QueryForm,
        attachment: Option<Upload>,
    ) -> Result<HelpQuery, SchoolServiceError> {
        if form.subject.trim().is_empty() || form.message.trim().is_empty() {
            return Err(SchoolServiceError::Invalid(
                "subject and message are required".to_string(),
            ));
        }

        let now = self.now();
        let attachment_url = match attachment {
            Some(upload) => {
                let path =
                    attachment_path(&caller.user_id, self.upload_stamp(), &upload.file_name);
                let stored = self.objects.upload(Bucket::Attachments, &path, upload)?;
                Some(self.objects.url(stored.bucket, &stored.path)?)
            }
            None => None,
        };

        let query = self.store.insert_query(HelpQuery {
            id: QueryId(next_record_id("qry")),
            parent_id: caller.user_id.clone(),
            subject: form.subject.trim().to_string(),
            message: form.message,
            attachment_url,
            status: QueryStatus::Open,
            reply: None,
            created_at: now,
            updated_at: now,
        })?;

        info!(query = %query.id, parent = %query.parent_id, "help query submitted");
        Ok(query)
    }

    pub fn my_queries(&self, caller: &Caller) -> Result<Vec<HelpQuery>, SchoolServiceError> {
        let mut queries = self.store.queries_for_parent(&caller.user_id)?;
        newest_first(&mut queries, |query| (query.created_at, query.id.clone()));
        Ok(queries)
    }

    pub fn all_queries(&self, caller: &Caller) -> Result<Vec<QueryWithParent>, SchoolServiceError> {
        caller.require_admin("listing all queries")?;
        let profiles = self.store.all_profiles()?;
        let mut rows = join_queries(self.store.all_queries()?, &profiles);
        newest_first(&mut rows, |row| (row.query.created_at, row.query.id.clone()));
        Ok(rows)
    }

    pub fn reply_query(
        &self,
        caller: &Caller,
        query_id: &QueryId,
        reply: String,
    ) -> Result<HelpQuery, SchoolServiceError> {
        caller.require_admin("replying to a query")?;
        if reply.trim().is_empty() {
            return Err(SchoolServiceError::Invalid("reply is required".to_string()));
        }
        let mut query = self.fetch_query(query_id)?;

        query.status = query.status.reply().map_err(|err| {
            warn!(query = %query_id, error = %err, "reply refused");
            err
        })?;
        query.reply = Some(reply);
        query.updated_at = self.now();
        self.store.update_query(query.clone())?;

        info!(query = %query.id, by = %caller.user_id, "help query replied");
        Ok(query)
    }

    pub fn close_query(
        &self,
        caller: &Caller,
        query_id: &QueryId,
    ) -> Result<HelpQuery, SchoolServiceError> {
        let mut query = self.fetch_query(query_id)?;
        caller.require_owner_or_admin(&query.parent_id, "closing a query")?;

        query.status = query.status.close()?;
        query.updated_at = self.now();
        self.store.update_query(query.clone())?;

        info!(query = %query.id, by = %caller.user_id, "help query closed");
        Ok(query)
    }

    fn fetch_query(&self, query_id: &QueryId) -> Result<HelpQuery, SchoolServiceError> {
        self.store
            .fetch_query(query_id)?
            .ok_or_else(|| SchoolServiceError::not_found("query", query_id))
    }
}
